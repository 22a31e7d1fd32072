//! Walks a stay through time and accumulates its cost.
//!
//! Band policies (flat and day-group) are walked in steps that end at the
//! next full hour, at the next band or free-period edge, or at departure,
//! whichever comes first. Each step is priced on its own and consecutive
//! steps of the same kind and rate are merged into one breakdown entry.
//!
//! Ladder policies are walked minute by minute. The ladder rate depends on
//! how many minutes of the stay have been *charged*, and free stretches in
//! the middle of a stay do not advance it, so hour-aligned steps would put
//! rank changes in the wrong place. Minutes are merged into runs by rank.
//! A rank is one charged hour even when a free gap splits it over several
//! runs, so the billing unit is applied to the rank's charged minutes once.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::trace;

use crate::billing::{billable_minutes, cost_for, round_cost};
use crate::breakdown::{period_label, CostBreakdownEntry, EntryKind};
use crate::calculate::CalculateOptions;
use crate::policy::{BillingGranularity, PricingPolicy, RateRule};
use crate::resolver::{resolve, RateSource};
use crate::time::{DayType, TimeOfDay};

/// Length of the free-first-hour grace.
const GRACE_MINUTES: u32 = 60;

/// A contiguous stretch of the stay at one kind and rate.
#[derive(Debug, Clone)]
struct Run {
    start: NaiveDateTime,
    end: NaiveDateTime,
    minutes: u32,
    charged_minutes: u32,
    rate: Decimal,
    kind: EntryKind,
    /// Last rank of the ladder the run was charged under; 0 for bands.
    last_rank: usize,
    cost: Decimal,
}

impl Run {
    fn continues(&self, next: &Run) -> bool {
        self.kind == next.kind
            && self.rate == next.rate
            && self.last_rank == next.last_rank
            && self.end == next.start
    }

    fn into_entry(self) -> CostBreakdownEntry {
        CostBreakdownEntry {
            label: period_label(self.start, self.end, self.kind, self.last_rank),
            kind: self.kind,
            start: Some(self.start),
            end: Some(self.end),
            minutes: self.minutes,
            charged_hours: round_cost(
                Decimal::from(self.charged_minutes) / Decimal::from(60),
                2,
            ),
            rate: self.rate,
            cost: self.cost,
        }
    }
}

/// Append `run`, folding it into the previous run when it continues it.
fn push_merged(runs: &mut Vec<Run>, run: Run) {
    match runs.last_mut() {
        Some(last) if last.continues(&run) => {
            last.end = run.end;
            last.minutes += run.minutes;
            last.charged_minutes += run.charged_minutes;
            last.cost += run.cost;
        }
        _ => runs.push(run),
    }
}

/// Price `[arrival, departure)` under `policy`, returning the breakdown in
/// time order without any daily-maximum adjustment.
///
/// The stay must already be validated (`departure > arrival`, whole
/// minutes); an empty or inverted stay yields no entries. The free-first-hour
/// grace is applied when the policy's grace window contains `arrival`.
pub fn accumulate(
    policy: &PricingPolicy,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    options: &CalculateOptions,
) -> Vec<CostBreakdownEntry> {
    let grace = policy
        .free_first_hour
        .as_ref()
        .is_some_and(|g| g.applies_to(arrival));

    let runs = match &policy.rates {
        Some(rule @ RateRule::ProgressiveLadder { .. }) => {
            walk_ladder(policy, rule, arrival, departure, grace, options)
        }
        _ => walk_bands(policy, arrival, departure, grace, options),
    };
    runs.into_iter().map(Run::into_entry).collect()
}

fn walk_bands(
    policy: &PricingPolicy,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    grace: bool,
    options: &CalculateOptions,
) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut grace_pending = grace;
    let mut now = arrival;

    while now < departure {
        let time = TimeOfDay::of(now.time());
        let boundary = policy.next_boundary(time);
        let step_end =
            (now + Duration::minutes(i64::from(boundary - time.minutes()))).min(departure);
        let minutes = (step_end - now).num_minutes() as u32;

        let resolved = resolve(now, policy);
        let (kind, charged_minutes) = if resolved.is_free {
            (
                EntryKind::Free {
                    source: resolved.source,
                },
                0,
            )
        } else if grace_pending {
            grace_pending = false;
            (
                EntryKind::FirstHourFree,
                minutes.saturating_sub(GRACE_MINUTES),
            )
        } else {
            (EntryKind::Charged, minutes)
        };

        let cost = round_cost(
            cost_for(charged_minutes, resolved.rate, policy.billing),
            options.cost_decimals,
        );
        trace!(%now, %step_end, rate = %resolved.rate, ?kind, %cost, "priced step");

        push_merged(
            &mut runs,
            Run {
                start: now,
                end: step_end,
                minutes,
                charged_minutes,
                rate: resolved.rate,
                kind,
                last_rank: 0,
                cost,
            },
        );
        now = step_end;
    }

    runs
}

fn walk_ladder(
    policy: &PricingPolicy,
    rule: &RateRule,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    grace: bool,
    options: &CalculateOptions,
) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut grace_left = if grace { GRACE_MINUTES } else { 0 };
    let mut charged_total: u32 = 0;
    let mut now = arrival;

    while now < departure {
        let next = now + Duration::minutes(1);
        let resolved = resolve(now, policy);
        let ladder = rule.ladder_for(DayType::of(now.date()));

        let (kind, rate, charged_minutes, last_rank) = match (resolved.source, ladder) {
            (RateSource::Ladder, Some(ladder)) => {
                let last_rank = ladder.last_rank();
                let rank = ((charged_total / 60) as usize).min(last_rank);
                if grace_left > 0 {
                    grace_left -= 1;
                    (EntryKind::FirstHourFree, ladder.rate_for_rank(rank), 0, last_rank)
                } else {
                    charged_total += 1;
                    (EntryKind::LadderRank { rank }, ladder.rate_for_rank(rank), 1, last_rank)
                }
            }
            (source, _) => (EntryKind::Free { source }, Decimal::ZERO, 0, 0),
        };

        push_merged(
            &mut runs,
            Run {
                start: now,
                end: next,
                minutes: 1,
                charged_minutes,
                rate,
                kind,
                last_rank,
                cost: Decimal::ZERO,
            },
        );
        now = next;
    }

    price_ladder_runs(&mut runs, policy.billing, options.cost_decimals);
    trace!(charged_minutes = charged_total, runs = runs.len(), "walked ladder");

    runs
}

/// Price ladder runs rank by rank.
///
/// Each rank's charged minutes are rounded up to the billing unit once and
/// the surplus is billed on the rank's last run. Costs are rounded on the
/// rank's running total, so the runs of a rank add up to the rank priced as
/// a whole.
fn price_ladder_runs(runs: &mut [Run], billing: BillingGranularity, decimals: u32) {
    let mut rank_minutes: HashMap<usize, u32> = HashMap::new();
    let mut last_run_of_rank: HashMap<usize, usize> = HashMap::new();
    for (index, run) in runs.iter().enumerate() {
        if let EntryKind::LadderRank { rank } = run.kind {
            *rank_minutes.entry(rank).or_default() += run.charged_minutes;
            last_run_of_rank.insert(rank, index);
        }
    }

    // rank -> (exact running cost, rounded cost already billed)
    let mut running: HashMap<usize, (Decimal, Decimal)> = HashMap::new();
    for (index, run) in runs.iter_mut().enumerate() {
        let EntryKind::LadderRank { rank } = run.kind else {
            continue;
        };
        let mut minutes = run.charged_minutes;
        if last_run_of_rank.get(&rank) == Some(&index) {
            let total = rank_minutes.get(&rank).copied().unwrap_or_default();
            minutes += billable_minutes(total, billing) - total;
        }

        let (exact, billed) = running.entry(rank).or_default();
        *exact += cost_for(minutes, run.rate, BillingGranularity::PerMinute);
        let rounded = round_cost(*exact, decimals);
        run.cost = rounded - *billed;
        *billed = rounded;
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
