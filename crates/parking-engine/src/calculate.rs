//! Pricing a stay end to end.
//!
//! [`calculate`] validates the stay, walks it through the policy with the
//! [accumulator](crate::accumulator), applies the daily maximum in force on
//! the arrival day and returns the itemized [`CostResult`]. It reads no clock
//! and holds no shared state, so quoting many parking areas can be spread
//! across threads freely.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use tracing::debug;

use crate::accumulator::accumulate;
use crate::breakdown::CostResult;
use crate::cap::apply_daily_cap;
use crate::error::PricingError;
use crate::policy::PricingPolicy;
use crate::time::DayType;

/// Options for [`calculate_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculateOptions {
    /// Decimal places every breakdown entry cost is rounded to before
    /// summing; 2 matches most currencies' minor unit.
    pub cost_decimals: u32,
}

impl Default for CalculateOptions {
    fn default() -> Self {
        Self { cost_decimals: 2 }
    }
}

/// Price a stay from `arrival` to `departure` under `policy`.
///
/// Uses [`CalculateOptions::default`]. For explicit rounding, use
/// [`calculate_with_options`].
///
/// # Errors
///
/// Returns [`PricingError::InvalidStay`] if `departure` is not at least one
/// whole minute after `arrival`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use parking_engine::policy::{Band, PricingPolicy, RateRule};
/// use parking_engine::calculate;
/// use rust_decimal::Decimal;
///
/// let policy = PricingPolicy::new(
///     "kr",
///     RateRule::Flat {
///         bands: vec![
///             Band::new("08:00-18:00", Decimal::from(16)).unwrap(),
///             Band::new("18:00-23:00", Decimal::from(17)).unwrap(),
///             Band::new("23:00-08:00", Decimal::from(6)).unwrap(),
///         ],
///     },
/// );
/// let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// let result = calculate(
///     &policy,
///     day.and_hms_opt(10, 0, 0).unwrap(),
///     day.and_hms_opt(14, 0, 0).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(result.total_cost, Decimal::from(64));
/// assert_eq!(result.breakdown.len(), 1);
/// ```
pub fn calculate(
    policy: &PricingPolicy,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
) -> Result<CostResult, PricingError> {
    calculate_with_options(policy, arrival, departure, &CalculateOptions::default())
}

/// Price a stay with explicit options.
///
/// # Errors
///
/// Returns [`PricingError::InvalidStay`] if `departure` is not at least one
/// whole minute after `arrival`.
pub fn calculate_with_options(
    policy: &PricingPolicy,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    options: &CalculateOptions,
) -> Result<CostResult, PricingError> {
    let (arrival, departure) = validate_stay(arrival, departure)?;

    let mut breakdown = accumulate(policy, arrival, departure, options);
    let accumulated: Decimal = breakdown.iter().map(|entry| entry.cost).sum();

    let max_daily = policy.max_daily_for(DayType::of(arrival.date()));
    let total_cost = apply_daily_cap(&mut breakdown, accumulated, max_daily);

    debug!(
        rule = policy.rates.as_ref().map_or("none", |rule| rule.kind()),
        %arrival,
        %departure,
        entries = breakdown.len(),
        %total_cost,
        "calculated parking cost"
    );

    Ok(CostResult {
        total_cost,
        currency: policy.currency.clone(),
        breakdown,
    })
}

/// Truncate both ends to whole minutes and reject stays that do not move
/// forward by at least one minute.
///
/// # Errors
///
/// Returns [`PricingError::InvalidStay`] when `departure <= arrival`, or when
/// both fall within the same minute.
pub fn validate_stay(
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), PricingError> {
    if departure <= arrival {
        return Err(PricingError::InvalidStay(format!(
            "departure {departure} is not after arrival {arrival}"
        )));
    }

    let arrival = truncate_to_minute(arrival);
    let departure = truncate_to_minute(departure);
    if departure == arrival {
        return Err(PricingError::InvalidStay(format!(
            "stay from {arrival} is shorter than one minute"
        )));
    }

    Ok((arrival, departure))
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::EntryKind;
    use crate::policy::{Band, BillingGranularity, FreeDate, Ladder, RateRule};
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn ladder(active: &str) -> PricingPolicy {
        let rates = [5, 10, 15, 20, 25, 25].into_iter().map(dec).collect();
        PricingPolicy::new(
            "kr",
            RateRule::ProgressiveLadder {
                weekdays: Ladder::new(active, rates, Some(dec(110))).unwrap(),
                saturday: None,
                sunday: None,
            },
        )
    }

    // ── Stay validation ─────────────────────────────────────────────────

    #[test]
    fn test_rejects_inverted_stay() {
        let err = calculate(&ladder("07:00-24:00"), at(6, 2, 12, 0), at(6, 2, 10, 0)).unwrap_err();
        assert!(matches!(err, PricingError::InvalidStay(_)));
    }

    #[test]
    fn test_rejects_zero_length_stay() {
        let err = calculate(&ladder("07:00-24:00"), at(6, 2, 12, 0), at(6, 2, 12, 0)).unwrap_err();
        assert!(matches!(err, PricingError::InvalidStay(_)));
    }

    #[test]
    fn test_rejects_sub_minute_stay() {
        let arrival = at(6, 2, 12, 0);
        let departure = arrival + chrono::Duration::seconds(30);
        assert!(matches!(
            validate_stay(arrival, departure),
            Err(PricingError::InvalidStay(_))
        ));
    }

    #[test]
    fn test_truncates_seconds() {
        let arrival = at(6, 2, 12, 0) + chrono::Duration::seconds(45);
        let departure = at(6, 2, 13, 0) + chrono::Duration::seconds(10);
        let (a, d) = validate_stay(arrival, departure).unwrap();
        assert_eq!(a, at(6, 2, 12, 0));
        assert_eq!(d, at(6, 2, 13, 0));
    }

    // ── Scenarios ───────────────────────────────────────────────────────

    #[test]
    fn test_ladder_six_hours_costs_100() {
        let result = calculate(&ladder("07:00-24:00"), at(6, 2, 7, 0), at(6, 2, 13, 0)).unwrap();
        assert_eq!(result.total_cost, dec(100));
        assert!(!result.is_capped());
        assert_eq!(result.currency, "kr");
    }

    #[test]
    fn test_ladder_full_day_hits_daily_maximum() {
        let result = calculate(&ladder("00:00-24:00"), at(6, 2, 0, 0), at(6, 3, 0, 0)).unwrap();
        assert_eq!(result.total_cost, dec(110));
        assert!(result.is_capped());
        assert_eq!(result.breakdown_sum(), result.total_cost);
    }

    #[test]
    fn test_ladder_day_with_evening_window_hits_daily_maximum() {
        let result = calculate(&ladder("07:00-24:00"), at(6, 2, 7, 0), at(6, 3, 7, 0)).unwrap();
        assert_eq!(result.total_cost, dec(110));
        let adjustment = result.breakdown.last().unwrap();
        assert_eq!(adjustment.kind, EntryKind::DailyMaximum);
        // 5+10+15+20+25 + 12*25 = 375
        assert_eq!(adjustment.cost, dec(110 - 375));
    }

    #[test]
    fn test_day_group_weekend_day() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::FlatByDayGroup {
                weekdays: vec![Band::new("00:00-24:00", dec(27)).unwrap()],
                weekends: vec![Band::new("00:00-24:00", Decimal::new(145, 1)).unwrap()],
            },
        )
        .with_billing(BillingGranularity::PerStartedHour);
        // 2025-06-07 is a Saturday
        let result = calculate(&policy, at(6, 7, 0, 0), at(6, 8, 0, 0)).unwrap();
        assert_eq!(result.total_cost, dec(348));
        assert_eq!(result.breakdown.len(), 1);
    }

    #[test]
    fn test_holiday_is_free() {
        let policy = ladder("07:00-24:00").with_free_date(FreeDate::new(12, 24).unwrap());
        let result = calculate(&policy, at(12, 24, 8, 0), at(12, 24, 16, 0)).unwrap();
        assert_eq!(result.total_cost, Decimal::ZERO);
        assert!(result.breakdown[0].label.ends_with("(holiday)"));
    }

    #[test]
    fn test_custom_rounding() {
        let policy = PricingPolicy::new(
            "kr",
            RateRule::Flat {
                bands: vec![Band::new("00:00-24:00", dec(17)).unwrap()],
            },
        );
        let options = CalculateOptions { cost_decimals: 0 };
        let result =
            calculate_with_options(&policy, at(6, 2, 10, 0), at(6, 2, 10, 7), &options).unwrap();
        assert_eq!(result.total_cost, dec(2));
    }
}
