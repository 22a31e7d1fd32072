//! Rate resolution for a single moment.
//!
//! [`resolve`] answers "what does parking cost per hour at this instant"
//! for a policy. Precedence, first match wins:
//!
//! 1. a free date (holiday) covering the calendar day
//! 2. a free period covering the day type and time of day
//! 3. the policy's [`RateRule`]: flat bands, day-group bands, or a ladder's
//!    active hours
//!
//! A moment that no band covers is free. Gaps in operator tables denote
//! no-charge windows, so an unmatched moment is never an error.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::policy::{find_band, PricingPolicy, RateRule};
use crate::time::{DayType, TimeOfDay};

/// Which part of the policy decided the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// A free date (holiday) matched.
    FreeDate,
    /// A free period matched.
    FreePeriod,
    /// A flat or day-group band matched.
    Band,
    /// Inside a ladder's active hours; the numeric rate depends on how much
    /// of the stay has been charged so far.
    Ladder,
    /// Nothing matched.
    Unmatched,
}

/// The outcome of resolving one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRate {
    /// Hourly rate. Always zero for [`RateSource::Ladder`]; the accumulator
    /// supplies the ladder rate.
    pub rate: Decimal,
    /// Whether the moment is free of charge.
    pub is_free: bool,
    pub source: RateSource,
}

impl ResolvedRate {
    fn free(source: RateSource) -> Self {
        Self {
            rate: Decimal::ZERO,
            is_free: true,
            source,
        }
    }

    fn band(rate: Decimal) -> Self {
        Self {
            rate,
            is_free: rate.is_zero(),
            source: RateSource::Band,
        }
    }

    fn ladder() -> Self {
        Self {
            rate: Decimal::ZERO,
            is_free: false,
            source: RateSource::Ladder,
        }
    }
}

/// Resolve the hourly rate in force at `at` under `policy`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use parking_engine::policy::{Band, PricingPolicy, RateRule};
/// use parking_engine::resolver::{resolve, RateSource};
/// use rust_decimal::Decimal;
///
/// let policy = PricingPolicy::new(
///     "kr",
///     RateRule::Flat {
///         bands: vec![Band::new("23:00-06:00", Decimal::from(6)).unwrap()],
///     },
/// );
/// let night = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap().and_hms_opt(2, 0, 0).unwrap();
/// let resolved = resolve(night, &policy);
/// assert_eq!(resolved.rate, Decimal::from(6));
/// assert_eq!(resolved.source, RateSource::Band);
/// ```
pub fn resolve(at: NaiveDateTime, policy: &PricingPolicy) -> ResolvedRate {
    let date = at.date();
    let day = DayType::of(date);
    let time = TimeOfDay::of(at.time());

    if policy.free_dates.iter().any(|d| d.matches(date)) {
        return ResolvedRate::free(RateSource::FreeDate);
    }

    if policy.free_periods.iter().any(|p| p.covers(date, time)) {
        return ResolvedRate::free(RateSource::FreePeriod);
    }

    match &policy.rates {
        None => ResolvedRate::free(RateSource::Unmatched),
        Some(RateRule::Flat { bands }) => find_band(bands, time)
            .map(|band| ResolvedRate::band(band.rate()))
            .unwrap_or_else(|| ResolvedRate::free(RateSource::Unmatched)),
        Some(RateRule::FlatByDayGroup { weekdays, weekends }) => {
            let bands = if day.is_weekend() { weekends } else { weekdays };
            find_band(bands, time)
                .map(|band| ResolvedRate::band(band.rate()))
                .unwrap_or_else(|| ResolvedRate::free(RateSource::Unmatched))
        }
        Some(rule @ RateRule::ProgressiveLadder { .. }) => match rule.ladder_for(day) {
            Some(ladder) if ladder.active_hours().contains(time) => ResolvedRate::ladder(),
            _ => ResolvedRate::free(RateSource::Unmatched),
        },
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Band, FreeDate, FreePeriod, Ladder};
    use crate::time::parse_interval;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn vesterbro_flat() -> PricingPolicy {
        PricingPolicy::new(
            "kr",
            RateRule::Flat {
                bands: vec![
                    Band::new("08:00-18:00", dec(16)).unwrap(),
                    Band::new("18:00-23:00", dec(17)).unwrap(),
                    Band::new("23:00-08:00", dec(6)).unwrap(),
                ],
            },
        )
    }

    fn carlsberg() -> PricingPolicy {
        PricingPolicy::new(
            "kr",
            RateRule::FlatByDayGroup {
                weekdays: vec![Band::new("00:00-24:00", dec(27)).unwrap()],
                weekends: vec![Band::new("00:00-24:00", Decimal::new(145, 1)).unwrap()],
            },
        )
    }

    // ── Flat ────────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_flat_bands() {
        let policy = vesterbro_flat();
        assert_eq!(resolve(at(2025, 6, 2, 10, 0), &policy).rate, dec(16));
        assert_eq!(resolve(at(2025, 6, 2, 18, 0), &policy).rate, dec(17));
        assert_eq!(resolve(at(2025, 6, 2, 23, 30), &policy).rate, dec(6));
        assert_eq!(resolve(at(2025, 6, 3, 2, 0), &policy).rate, dec(6));
    }

    #[test]
    fn test_resolve_flat_gap_is_free() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::Flat {
                bands: vec![Band::new("08:00-18:00", dec(16)).unwrap()],
            },
        );
        let resolved = resolve(at(2025, 6, 2, 20, 0), &policy);
        assert!(resolved.is_free);
        assert_eq!(resolved.rate, Decimal::ZERO);
        assert_eq!(resolved.source, RateSource::Unmatched);
    }

    #[test]
    fn test_resolve_zero_rate_band_is_free() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::Flat {
                bands: vec![Band::new("17:00-08:00", Decimal::ZERO).unwrap()],
            },
        );
        let resolved = resolve(at(2025, 6, 2, 20, 0), &policy);
        assert!(resolved.is_free);
        assert_eq!(resolved.source, RateSource::Band);
    }

    #[test]
    fn test_resolve_without_rule_is_free() {
        let mut policy = vesterbro_flat();
        policy.rates = None;
        assert!(resolve(at(2025, 6, 2, 10, 0), &policy).is_free);
    }

    // ── Day groups ──────────────────────────────────────────────────────

    #[test]
    fn test_resolve_day_group_weekday_and_weekend() {
        let policy = carlsberg();
        // 2025-06-06 Friday, 2025-06-07 Saturday, 2025-06-08 Sunday
        assert_eq!(resolve(at(2025, 6, 6, 12, 0), &policy).rate, dec(27));
        assert_eq!(resolve(at(2025, 6, 7, 12, 0), &policy).rate, Decimal::new(145, 1));
        assert_eq!(resolve(at(2025, 6, 8, 23, 59), &policy).rate, Decimal::new(145, 1));
    }

    #[test]
    fn test_resolve_day_group_missing_weekend_table_is_free() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::FlatByDayGroup {
                weekdays: vec![Band::new("00:00-24:00", dec(27)).unwrap()],
                weekends: vec![],
            },
        );
        assert!(resolve(at(2025, 6, 7, 12, 0), &policy).is_free);
    }

    // ── Ladder ──────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_ladder_reports_active_window() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::ProgressiveLadder {
                weekdays: Ladder::new("07:00-24:00", vec![dec(5), dec(10)], Some(dec(110))).unwrap(),
                saturday: Some(Ladder::new("07:00-17:00", vec![dec(5), dec(10)], None).unwrap()),
                sunday: None,
            },
        );
        let active = resolve(at(2025, 6, 2, 7, 0), &policy);
        assert_eq!(active.source, RateSource::Ladder);
        assert!(!active.is_free);

        let early = resolve(at(2025, 6, 2, 6, 59), &policy);
        assert_eq!(early.source, RateSource::Unmatched);
        assert!(early.is_free);

        // Saturday ladder stops at 17:00
        assert!(resolve(at(2025, 6, 7, 17, 0), &policy).is_free);
        assert!(!resolve(at(2025, 6, 7, 16, 59), &policy).is_free);
    }

    // ── Precedence ──────────────────────────────────────────────────────

    #[test]
    fn test_free_date_beats_everything() {
        let policy = vesterbro_flat()
            .with_free_date(FreeDate::new(12, 24).unwrap())
            .with_free_period(FreePeriod::new(
                vec![parse_interval("10:00-11:00").unwrap()],
                vec![],
            ));
        let resolved = resolve(at(2025, 12, 24, 10, 30), &policy);
        assert_eq!(resolved.source, RateSource::FreeDate);
        assert!(resolved.is_free);
    }

    #[test]
    fn test_free_period_beats_rate_rule() {
        let policy = vesterbro_flat().with_free_period(FreePeriod::new(
            vec![parse_interval("17:00-08:00").unwrap()],
            vec![DayType::Saturday, DayType::Sunday],
        ));
        // Saturday evening is free
        let saturday = resolve(at(2025, 6, 7, 20, 0), &policy);
        assert_eq!(saturday.source, RateSource::FreePeriod);
        // A weekday evening still pays the band rate
        let weekday = resolve(at(2025, 6, 4, 20, 0), &policy);
        assert_eq!(weekday.rate, dec(17));
    }

    #[test]
    fn test_free_period_without_days_applies_daily() {
        let policy = carlsberg().with_free_period(FreePeriod::new(
            vec![parse_interval("12:00-13:00").unwrap()],
            vec![],
        ));
        assert!(resolve(at(2025, 6, 4, 12, 30), &policy).is_free);
        assert!(resolve(at(2025, 6, 7, 12, 30), &policy).is_free);
        assert!(!resolve(at(2025, 6, 7, 13, 0), &policy).is_free);
    }
}
