//! Distance from a search point to parking area geometry.

use std::str::FromStr;

use serde::Deserialize;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl FromStr for Coordinate {
    type Err = String;

    /// Parse `"<latitude>,<longitude>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LON, got '{s}'"))?;
        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude '{lat}'"))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude '{lon}'"))?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("coordinate out of range: '{s}'"));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Great-circle distance between two points (haversine).
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distance from `point` to the closest point of `geometry`.
///
/// Understands a single `{latitude, longitude}` object or a list of them;
/// returns `None` for anything else.
pub fn closest_distance_km(point: Coordinate, geometry: &serde_json::Value) -> Option<f64> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Point(Coordinate),
        Points(Vec<Coordinate>),
    }

    let points = match Shape::deserialize(geometry).ok()? {
        Shape::Point(p) => vec![p],
        Shape::Points(points) => points,
    };
    points
        .into_iter()
        .map(|p| haversine_km(point, p))
        .min_by(f64::total_cmp)
}
