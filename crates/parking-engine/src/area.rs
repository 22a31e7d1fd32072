//! Parking areas, datasets and per-area quotes.
//!
//! Geometry is carried as opaque JSON: locating areas and measuring
//! distance belong to the caller, which hands the distance back in when
//! asking for a [`AreaQuote`].

use std::io::Read;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::breakdown::CostResult;
use crate::calculate::{calculate_with_options, CalculateOptions};
use crate::error::PricingError;
use crate::policy::PricingPolicy;

/// One parking area and its pricing policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParkingArea {
    pub id: String,
    pub name: String,
    /// Operator's own wording of the tariff, for display.
    #[serde(default)]
    pub description: Option<String>,
    /// Shape of the area in whatever form the data source uses.
    #[serde(default)]
    pub geometry: serde_json::Value,
    pub policy: PricingPolicy,
}

/// A priced stay at one area, merged with the caller-supplied distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaQuote {
    pub area_id: String,
    pub name: String,
    /// Distance from the search point, as measured by the caller.
    pub distance_km: f64,
    #[serde(flatten)]
    pub cost: CostResult,
}

impl ParkingArea {
    /// Price a stay at this area.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidStay`] for an empty or inverted stay.
    pub fn cost(
        &self,
        arrival: NaiveDateTime,
        departure: NaiveDateTime,
        options: &CalculateOptions,
    ) -> Result<CostResult, PricingError> {
        calculate_with_options(&self.policy, arrival, departure, options)
    }

    /// Price a stay and attach `distance_km`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidStay`] for an empty or inverted stay.
    pub fn quote(
        &self,
        distance_km: f64,
        arrival: NaiveDateTime,
        departure: NaiveDateTime,
        options: &CalculateOptions,
    ) -> Result<AreaQuote, PricingError> {
        Ok(AreaQuote {
            area_id: self.id.clone(),
            name: self.name.clone(),
            distance_km,
            cost: self.cost(arrival, departure, options)?,
        })
    }
}

/// Quote every `(area, distance_km)` candidate for the same stay, in input order.
///
/// # Errors
///
/// Returns [`PricingError::InvalidStay`] for an empty or inverted stay; the
/// stay is checked once, so either every area is quoted or none is.
pub fn quote_areas<'a, I>(
    candidates: I,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    options: &CalculateOptions,
) -> Result<Vec<AreaQuote>, PricingError>
where
    I: IntoIterator<Item = (&'a ParkingArea, f64)>,
{
    crate::calculate::validate_stay(arrival, departure)?;
    candidates
        .into_iter()
        .map(|(area, distance_km)| area.quote(distance_km, arrival, departure, options))
        .collect()
}

// ── Dataset ─────────────────────────────────────────────────────────────────

/// A collection of parking areas as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParkingDataset {
    pub parking_areas: Vec<ParkingArea>,
}

impl ParkingDataset {
    /// Parse and validate a dataset. Every time string, ladder, free date and
    /// grace period is checked here, so a loaded dataset never fails later.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidData`] describing the first problem found.
    pub fn from_json(json: &str) -> Result<Self, PricingError> {
        serde_json::from_str(json).map_err(|e| PricingError::InvalidData(e.to_string()))
    }

    /// Like [`from_json`](Self::from_json), reading from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidData`] for unreadable or invalid data.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PricingError> {
        serde_json::from_reader(reader).map_err(|e| PricingError::InvalidData(e.to_string()))
    }

    /// Look up an area by id, or by name ignoring case.
    pub fn find(&self, key: &str) -> Option<&ParkingArea> {
        self.parking_areas
            .iter()
            .find(|area| area.id == key || area.name.eq_ignore_ascii_case(key))
    }
}
