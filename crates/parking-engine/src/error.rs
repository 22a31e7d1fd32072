//! Error types for parking-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Malformed time: {0}")]
    MalformedTime(String),

    #[error("Degenerate interval: {0}")]
    DegenerateInterval(String),

    #[error("Invalid stay: {0}")]
    InvalidStay(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid policy data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, PricingError>;
