//! Daily maximum applied after accumulation.

use rust_decimal::Decimal;
use tracing::debug;

use crate::breakdown::{CostBreakdownEntry, EntryKind};

/// Clamp `total` to `max_daily`, recording the clamp as a negative entry so
/// the breakdown still sums to the returned total.
///
/// Returns `total` unchanged when there is no cap or the total is within it.
pub fn apply_daily_cap(
    breakdown: &mut Vec<CostBreakdownEntry>,
    total: Decimal,
    max_daily: Option<Decimal>,
) -> Decimal {
    let Some(cap) = max_daily else {
        return total;
    };
    if total <= cap {
        return total;
    }

    let adjustment = cap - total;
    debug!(%total, %cap, %adjustment, "daily maximum reached");

    breakdown.push(CostBreakdownEntry {
        label: format!("daily maximum {cap}"),
        kind: EntryKind::DailyMaximum,
        start: None,
        end: None,
        minutes: 0,
        charged_hours: Decimal::ZERO,
        rate: Decimal::ZERO,
        cost: adjustment,
    });

    cap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charged(cost: i64) -> CostBreakdownEntry {
        CostBreakdownEntry {
            label: "period".to_string(),
            kind: EntryKind::Charged,
            start: None,
            end: None,
            minutes: 60,
            charged_hours: Decimal::ONE,
            rate: Decimal::from(cost),
            cost: Decimal::from(cost),
        }
    }

    #[test]
    fn test_cap_clamps_and_records_adjustment() {
        let mut breakdown = vec![charged(200), charged(175)];
        let total = apply_daily_cap(&mut breakdown, Decimal::from(375), Some(Decimal::from(110)));
        assert_eq!(total, Decimal::from(110));
        assert_eq!(breakdown.len(), 3);

        let adjustment = breakdown.last().unwrap();
        assert_eq!(adjustment.kind, EntryKind::DailyMaximum);
        assert_eq!(adjustment.cost, Decimal::from(-265));
        assert_eq!(adjustment.label, "daily maximum 110");

        let sum: Decimal = breakdown.iter().map(|e| e.cost).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_cap_not_reached() {
        let mut breakdown = vec![charged(100)];
        let total = apply_daily_cap(&mut breakdown, Decimal::from(100), Some(Decimal::from(110)));
        assert_eq!(total, Decimal::from(100));
        assert_eq!(breakdown.len(), 1);
    }

    #[test]
    fn test_cap_exactly_reached_adds_no_entry() {
        let mut breakdown = vec![charged(110)];
        let total = apply_daily_cap(&mut breakdown, Decimal::from(110), Some(Decimal::from(110)));
        assert_eq!(total, Decimal::from(110));
        assert_eq!(breakdown.len(), 1);
    }

    #[test]
    fn test_no_cap() {
        let mut breakdown = vec![charged(500)];
        let total = apply_daily_cap(&mut breakdown, Decimal::from(500), None);
        assert_eq!(total, Decimal::from(500));
        assert_eq!(breakdown.len(), 1);
    }
}
