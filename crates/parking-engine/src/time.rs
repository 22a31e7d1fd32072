//! Wall-clock time model for pricing tables.
//!
//! Pricing tables describe their bands as `"HH:MM-HH:MM"` strings in the
//! operator's local time. This module turns those strings into minute-based
//! values and owns the single containment predicate every rule type uses to
//! decide whether a moment falls inside a band.
//!
//! # Overnight bands
//!
//! An interval whose end is not after its start crosses midnight:
//! `"23:00-06:00"` covers 23:00 through 05:59 of the following morning. It is
//! stored with its end shifted by 24 hours, and [`TimeInterval::contains`]
//! checks a moment both as-is and shifted by a day.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ── TimeOfDay ───────────────────────────────────────────────────────────────

/// A moment of the day with minute precision, in `[00:00, 24:00)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u32,
}

impl TimeOfDay {
    /// Midnight, the start of the day.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { minutes: 0 };

    /// Build from minutes since midnight; values of a day or more wrap around.
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    /// Build from fractional hours (`23.5` is 23:30), snapped to the nearest
    /// minute. Values outside `[0, 24)` wrap around.
    pub fn from_hours(hours: f64) -> Self {
        let minutes = (hours * 60.0).round() as i64;
        Self {
            minutes: minutes.rem_euclid(MINUTES_PER_DAY as i64) as u32,
        }
    }

    /// The time-of-day component of a wall-clock time.
    pub fn of(time: NaiveTime) -> Self {
        Self {
            minutes: time.hour() * 60 + time.minute(),
        }
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        self.minutes
    }

    /// Fractional hours since midnight.
    pub fn hours(self) -> f64 {
        f64::from(self.minutes) / 60.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_of_day(s)
    }
}

/// Parse an `"HH:MM"` string into a [`TimeOfDay`].
///
/// # Errors
///
/// Returns [`PricingError::MalformedTime`] unless the input is exactly two
/// numeric components separated by `:`, with hours below 24 and minutes below 60.
///
/// # Examples
///
/// ```
/// use parking_engine::time::parse_time_of_day;
///
/// let t = parse_time_of_day("08:30").unwrap();
/// assert_eq!(t.hours(), 8.5);
/// assert!(parse_time_of_day("8h30").is_err());
/// ```
pub fn parse_time_of_day(s: &str) -> Result<TimeOfDay, PricingError> {
    let minutes = parse_clock_minutes(s)?;
    if minutes >= MINUTES_PER_DAY {
        return Err(PricingError::MalformedTime(format!(
            "'{}': 24:00 is only valid as the end of an interval",
            s.trim()
        )));
    }
    Ok(TimeOfDay { minutes })
}

/// Parse `"HH:MM"` into minutes since midnight, allowing `"24:00"`.
fn parse_clock_minutes(s: &str) -> Result<u32, PricingError> {
    let s = s.trim();
    let malformed = |reason: &str| PricingError::MalformedTime(format!("'{s}': {reason}"));

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(malformed("expected HH:MM"));
    }

    let number = |part: &str| -> Result<u32, PricingError> {
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("components must be one or two digits"));
        }
        part.parse().map_err(|_| malformed("invalid number"))
    };

    let hours = number(parts[0])?;
    let minutes = number(parts[1])?;

    if minutes >= 60 {
        return Err(malformed("minutes must be below 60"));
    }
    if hours > 24 || (hours == 24 && minutes != 0) {
        return Err(malformed("hours must be below 24"));
    }

    Ok(hours * 60 + minutes)
}

// ── TimeInterval ────────────────────────────────────────────────────────────

/// A daily band such as `"08:00-18:00"` or the overnight `"23:00-06:00"`.
///
/// The end is normalized to lie after the start, so an overnight band ends
/// past 24:00. Zero-length bands cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TimeInterval {
    start: u32,
    end: u32,
}

impl TimeInterval {
    /// Parse an `"HH:MM-HH:MM"` band. See [`parse_interval`].
    pub fn parse(s: &str) -> Result<Self, PricingError> {
        parse_interval(s)
    }

    /// The band's start time.
    pub fn start(&self) -> TimeOfDay {
        TimeOfDay {
            minutes: self.start,
        }
    }

    /// Whether `time` falls in `[start, end)`, also checking `time + 24h` so
    /// that overnight bands match early-morning moments.
    ///
    /// Every rule type decides band membership through this method.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        let m = time.minutes;
        let shifted = m + MINUTES_PER_DAY;
        (m >= self.start && m < self.end) || (shifted >= self.start && shifted < self.end)
    }

    /// [`contains`](Self::contains) for a fractional hour such as `23.5`.
    pub fn contains_hour(&self, hour: f64) -> bool {
        self.contains(TimeOfDay::from_hours(hour))
    }

    /// Start and end as minutes of the day, the points where a rate can change.
    pub(crate) fn boundaries(&self) -> [u32; 2] {
        [self.start, self.end % MINUTES_PER_DAY]
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = if self.end == MINUTES_PER_DAY {
            "24:00".to_string()
        } else {
            TimeOfDay::from_minutes(self.end).to_string()
        };
        write!(f, "{}-{}", self.start(), end)
    }
}

impl FromStr for TimeInterval {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_interval(s)
    }
}

impl TryFrom<String> for TimeInterval {
    type Error = PricingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_interval(&s)
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse an `"HH:MM-HH:MM"` band into a [`TimeInterval`].
///
/// An end at or before the start means the band crosses midnight and the end
/// is shifted by 24 hours. `"24:00"` is accepted as an end only.
///
/// # Errors
///
/// Returns [`PricingError::MalformedTime`] if the string is not two valid
/// times joined by `-`, and [`PricingError::DegenerateInterval`] if both
/// times are equal.
///
/// # Examples
///
/// ```
/// use parking_engine::time::parse_interval;
///
/// let night = parse_interval("23:00-06:00").unwrap();
/// assert_eq!(night.to_string(), "23:00-06:00");
/// assert!(night.contains_hour(23.5));
/// assert!(night.contains_hour(2.0));
/// assert!(!night.contains_hour(12.0));
/// ```
pub fn parse_interval(s: &str) -> Result<TimeInterval, PricingError> {
    let trimmed = s.trim();
    let (start_str, end_str) = trimmed.split_once('-').ok_or_else(|| {
        PricingError::MalformedTime(format!("'{trimmed}': expected HH:MM-HH:MM"))
    })?;

    let start = parse_time_of_day(start_str)?.minutes;
    let mut end = parse_clock_minutes(end_str)?;

    if end == start {
        return Err(PricingError::DegenerateInterval(format!(
            "'{trimmed}': start and end are equal"
        )));
    }
    if end < start {
        end += MINUTES_PER_DAY;
    }

    Ok(TimeInterval { start, end })
}

// ── DayType ─────────────────────────────────────────────────────────────────

/// Calendar classification used to pick day-specific rate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    /// Monday through Friday.
    #[serde(alias = "weekdays")]
    Weekday,
    Saturday,
    Sunday,
}

impl DayType {
    /// Classify a calendar date by its weekday.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => DayType::Saturday,
            Weekday::Sun => DayType::Sunday,
            _ => DayType::Weekday,
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayType::Saturday | DayType::Sunday)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
