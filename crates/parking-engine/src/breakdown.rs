//! Itemized cost results.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::resolver::RateSource;

/// What a breakdown entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Time charged at a band rate.
    Charged,
    /// Time charged at the given zero-based ladder rank. The last rank also
    /// covers every later hour.
    LadderRank { rank: usize },
    /// Time that costs nothing.
    Free { source: RateSource },
    /// Chargeable time waived by the free-first-hour grace.
    FirstHourFree,
    /// Negative adjustment bringing the total down to the daily maximum.
    DailyMaximum,
}

/// One line of a [`CostResult`]: a merged run of time at one rate, or the
/// daily-maximum adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBreakdownEntry {
    /// Human-readable period, e.g. `"Jun 01 10:00 - Jun 01 14:00"`.
    pub label: String,
    pub kind: EntryKind,
    /// Start of the period; `None` for the daily-maximum adjustment.
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Elapsed minutes covered by the entry.
    pub minutes: u32,
    /// Hours actually charged, rounded to two decimals.
    pub charged_hours: Decimal,
    /// Hourly rate applied.
    pub rate: Decimal,
    /// Cost of the entry; negative only for the daily-maximum adjustment.
    pub cost: Decimal,
}

/// The priced stay: the total and the entries it is made of.
///
/// `total_cost` always equals the sum of the entry costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostResult {
    pub total_cost: Decimal,
    /// Currency label copied from the policy.
    pub currency: String,
    pub breakdown: Vec<CostBreakdownEntry>,
}

impl CostResult {
    /// Sum of every breakdown entry's cost.
    pub fn breakdown_sum(&self) -> Decimal {
        self.breakdown.iter().map(|entry| entry.cost).sum()
    }

    /// Whether a daily maximum clamped the total.
    pub fn is_capped(&self) -> bool {
        self.breakdown
            .iter()
            .any(|entry| entry.kind == EntryKind::DailyMaximum)
    }
}

/// `"Jun 01 10:00 - Jun 01 14:00"` plus a suffix describing the kind.
pub(crate) fn period_label(
    start: NaiveDateTime,
    end: NaiveDateTime,
    kind: EntryKind,
    last_rank: usize,
) -> String {
    const FORMAT: &str = "%b %d %H:%M";
    let period = format!("{} - {}", start.format(FORMAT), end.format(FORMAT));
    match kind {
        EntryKind::Charged | EntryKind::DailyMaximum => period,
        EntryKind::LadderRank { rank } if rank >= last_rank => {
            format!("{period} (hour {}+)", rank + 1)
        }
        EntryKind::LadderRank { rank } => format!("{period} (hour {})", rank + 1),
        EntryKind::Free {
            source: RateSource::FreeDate,
        } => format!("{period} (holiday)"),
        EntryKind::Free { .. } => format!("{period} (free)"),
        EntryKind::FirstHourFree => format!("{period} (first hour free)"),
    }
}
