//! # parking-engine
//!
//! Deterministic parking cost computation.
//!
//! Given a parking operator's pricing policy and an arrival/departure
//! interval, the engine walks the stay through time, resolves which rule
//! applies to each stretch, accumulates the cost under the policy's billing
//! granularity, applies the daily maximum and returns the total with an
//! itemized breakdown that always sums to it.
//!
//! ## Modules
//!
//! - [`time`]: `"HH:MM"` and `"HH:MM-HH:MM"` parsing, overnight bands, day types
//! - [`policy`]: Typed pricing policies: bands, day groups, progressive ladders, free periods
//! - [`resolver`]: Which rate applies at a given moment, with holiday/free-period precedence
//! - [`billing`]: Minutes-to-money conversion per billing granularity
//! - [`accumulator`]: Walks a stay and builds the merged breakdown
//! - [`cap`]: Daily maximum as a visible negative adjustment
//! - [`calculate`]: End-to-end pricing of a stay
//! - [`area`]: Parking areas, JSON datasets and per-area quotes
//! - [`breakdown`]: Result types
//! - [`error`]: Error types

pub mod accumulator;
pub mod area;
pub mod billing;
pub mod breakdown;
pub mod calculate;
pub mod cap;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod time;

pub use area::{quote_areas, AreaQuote, ParkingArea, ParkingDataset};
pub use billing::cost_for;
pub use breakdown::{CostBreakdownEntry, CostResult, EntryKind};
pub use calculate::{calculate, calculate_with_options, validate_stay, CalculateOptions};
pub use error::PricingError;
pub use policy::{
    Band, BillingGranularity, FreeDate, FreeFirstHourGrace, FreePeriod, Ladder, PricingPolicy,
    RateRule,
};
pub use resolver::{resolve, RateSource, ResolvedRate};
pub use time::{parse_interval, parse_time_of_day, DayType, TimeInterval, TimeOfDay};
