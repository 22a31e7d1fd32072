//! Conversion of chargeable minutes into money.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::policy::BillingGranularity;

/// Cost of `minutes` at `hourly_rate` under `granularity`.
///
/// | Granularity | Cost |
/// |---|---|
/// | `PerMinute` | `minutes / 60 × rate` |
/// | `PerStartedHour` | `⌈minutes / 60⌉ × rate` |
/// | `Per15Min` | `⌈minutes / 15⌉ × rate / 4` |
/// | `Per30Min` | `⌈minutes / 30⌉ × rate / 2` |
///
/// A zero rate or no minutes costs nothing.
///
/// # Examples
///
/// ```
/// use parking_engine::billing::cost_for;
/// use parking_engine::policy::BillingGranularity;
/// use rust_decimal::Decimal;
///
/// let rate = Decimal::from(16);
/// assert_eq!(cost_for(90, rate, BillingGranularity::PerMinute), Decimal::from(24));
/// assert_eq!(cost_for(90, rate, BillingGranularity::PerStartedHour), Decimal::from(32));
/// ```
pub fn cost_for(minutes: u32, hourly_rate: Decimal, granularity: BillingGranularity) -> Decimal {
    if minutes == 0 || hourly_rate.is_zero() {
        return Decimal::ZERO;
    }
    Decimal::from(billable_minutes(minutes, granularity)) * hourly_rate / Decimal::from(60)
}

/// `minutes` rounded up to a whole number of billing units.
pub fn billable_minutes(minutes: u32, granularity: BillingGranularity) -> u32 {
    let unit = granularity.unit_minutes();
    minutes.div_ceil(unit) * unit
}

/// Round a cost to `decimals` places, halves away from zero.
pub fn round_cost(cost: Decimal, decimals: u32) -> Decimal {
    cost.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_per_minute_is_proportional() {
        assert_eq!(cost_for(60, dec(16), BillingGranularity::PerMinute), dec(16));
        assert_eq!(cost_for(30, dec(16), BillingGranularity::PerMinute), dec(8));
        assert_eq!(cost_for(1, dec(60), BillingGranularity::PerMinute), dec(1));
    }

    #[test]
    fn test_per_started_hour_rounds_up() {
        assert_eq!(cost_for(1, dec(27), BillingGranularity::PerStartedHour), dec(27));
        assert_eq!(cost_for(60, dec(27), BillingGranularity::PerStartedHour), dec(27));
        assert_eq!(cost_for(61, dec(27), BillingGranularity::PerStartedHour), dec(54));
    }

    #[test]
    fn test_quarter_and_half_hour_units() {
        assert_eq!(cost_for(16, dec(20), BillingGranularity::Per15Min), dec(10));
        assert_eq!(cost_for(15, dec(20), BillingGranularity::Per15Min), dec(5));
        assert_eq!(cost_for(31, dec(20), BillingGranularity::Per30Min), dec(20));
        assert_eq!(cost_for(30, dec(20), BillingGranularity::Per30Min), dec(10));
    }

    #[test]
    fn test_billable_minutes_rounds_up_to_unit() {
        assert_eq!(billable_minutes(0, BillingGranularity::PerStartedHour), 0);
        assert_eq!(billable_minutes(7, BillingGranularity::PerMinute), 7);
        assert_eq!(billable_minutes(7, BillingGranularity::Per15Min), 15);
        assert_eq!(billable_minutes(31, BillingGranularity::Per30Min), 60);
        assert_eq!(billable_minutes(61, BillingGranularity::PerStartedHour), 120);
    }

    #[test]
    fn test_zero_rate_short_circuits() {
        for granularity in [
            BillingGranularity::PerMinute,
            BillingGranularity::PerStartedHour,
            BillingGranularity::Per15Min,
            BillingGranularity::Per30Min,
        ] {
            assert_eq!(cost_for(45, Decimal::ZERO, granularity), Decimal::ZERO);
            assert_eq!(cost_for(0, dec(16), granularity), Decimal::ZERO);
        }
    }

    #[test]
    fn test_fractional_rate() {
        let rate = Decimal::new(145, 1);
        assert_eq!(
            cost_for(90, rate, BillingGranularity::PerStartedHour),
            dec(29)
        );
        assert_eq!(
            cost_for(15, rate, BillingGranularity::Per15Min),
            Decimal::new(3625, 3)
        );
    }

    #[test]
    fn test_round_cost_half_away_from_zero() {
        assert_eq!(round_cost(Decimal::new(1125, 3), 2), Decimal::new(113, 2));
        assert_eq!(round_cost(Decimal::new(-1125, 3), 2), Decimal::new(-113, 2));
        // 7 minutes at 17/h = 1.98333...
        let cost = cost_for(7, dec(17), BillingGranularity::PerMinute);
        assert_eq!(round_cost(cost, 2), Decimal::new(198, 2));
    }
}
