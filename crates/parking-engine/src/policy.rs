//! Typed pricing policies.
//!
//! A [`PricingPolicy`] combines at most one [`RateRule`] with free-period
//! carve-outs, free dates, an optional free-first-hour grace and a billing
//! granularity. Every component validates itself on construction (directly or
//! through serde), so a policy value is always well formed and the engine
//! never has to re-check it while walking a stay.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::time::{
    parse_interval, parse_time_of_day, DayType, TimeInterval, TimeOfDay, MINUTES_PER_DAY,
};

// ── Bands ───────────────────────────────────────────────────────────────────

/// A fixed hourly rate over a daily band.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BandDocument")]
pub struct Band {
    interval: TimeInterval,
    rate: Decimal,
}

#[derive(Deserialize)]
struct BandDocument {
    times: TimeInterval,
    rate: Decimal,
}

impl TryFrom<BandDocument> for Band {
    type Error = PricingError;

    fn try_from(doc: BandDocument) -> Result<Self, Self::Error> {
        Band::with_interval(doc.times, doc.rate)
    }
}

impl Band {
    /// Build a band from an `"HH:MM-HH:MM"` string and an hourly rate.
    ///
    /// # Errors
    ///
    /// Fails if the interval does not parse or the rate is negative.
    pub fn new(times: &str, rate: Decimal) -> Result<Self, PricingError> {
        Self::with_interval(parse_interval(times)?, rate)
    }

    pub fn with_interval(interval: TimeInterval, rate: Decimal) -> Result<Self, PricingError> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(PricingError::InvalidPolicy(format!(
                "band {interval} has negative rate {rate}"
            )));
        }
        Ok(Self { interval, rate })
    }

    pub fn interval(&self) -> &TimeInterval {
        &self.interval
    }

    /// Hourly rate charged inside the band.
    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

/// First band containing `time`, in declaration order.
pub(crate) fn find_band(bands: &[Band], time: TimeOfDay) -> Option<&Band> {
    bands.iter().find(|band| band.interval.contains(time))
}

// ── Ladder ──────────────────────────────────────────────────────────────────

/// A progressive schedule: the n-th charged hour of a stay costs `rates[n]`,
/// and the last rate repeats for every hour past the end of the list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LadderDocument")]
pub struct Ladder {
    active_hours: TimeInterval,
    rates: Vec<Decimal>,
    max_daily: Option<Decimal>,
}

#[derive(Deserialize)]
struct LadderDocument {
    active_hours: TimeInterval,
    rates: Vec<Decimal>,
    #[serde(default)]
    max_daily: Option<Decimal>,
}

impl TryFrom<LadderDocument> for Ladder {
    type Error = PricingError;

    fn try_from(doc: LadderDocument) -> Result<Self, Self::Error> {
        Ladder::with_interval(doc.active_hours, doc.rates, doc.max_daily)
    }
}

impl Ladder {
    /// Build a ladder charged during `active_hours` (an `"HH:MM-HH:MM"` band).
    ///
    /// # Errors
    ///
    /// Fails if the band does not parse, `rates` is empty, or any rate or the
    /// cap is negative.
    pub fn new(
        active_hours: &str,
        rates: Vec<Decimal>,
        max_daily: Option<Decimal>,
    ) -> Result<Self, PricingError> {
        Self::with_interval(parse_interval(active_hours)?, rates, max_daily)
    }

    pub fn with_interval(
        active_hours: TimeInterval,
        rates: Vec<Decimal>,
        max_daily: Option<Decimal>,
    ) -> Result<Self, PricingError> {
        if rates.is_empty() {
            return Err(PricingError::InvalidPolicy(format!(
                "ladder for {active_hours} has no rates"
            )));
        }
        if let Some(rate) = rates.iter().find(|r| r.is_sign_negative() && !r.is_zero()) {
            return Err(PricingError::InvalidPolicy(format!(
                "ladder for {active_hours} has negative rate {rate}"
            )));
        }
        if let Some(cap) = max_daily.filter(|c| c.is_sign_negative() && !c.is_zero()) {
            return Err(PricingError::InvalidPolicy(format!(
                "ladder for {active_hours} has negative daily maximum {cap}"
            )));
        }
        Ok(Self {
            active_hours,
            rates,
            max_daily,
        })
    }

    /// The daily band during which the ladder charges.
    pub fn active_hours(&self) -> &TimeInterval {
        &self.active_hours
    }

    pub fn rates(&self) -> &[Decimal] {
        &self.rates
    }

    pub fn max_daily(&self) -> Option<Decimal> {
        self.max_daily
    }

    /// Rate for the zero-based charged-hour `rank`, saturating at the last rung.
    pub fn rate_for_rank(&self, rank: usize) -> Decimal {
        let last = self.rates.len() - 1;
        self.rates[rank.min(last)]
    }

    /// Highest rank with its own rate; every later hour shares it.
    pub(crate) fn last_rank(&self) -> usize {
        self.rates.len() - 1
    }
}

// ── RateRule ────────────────────────────────────────────────────────────────

/// The primary rate table of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateRule {
    /// The same bands every day.
    Flat { bands: Vec<Band> },
    /// Separate bands for Monday–Friday and for Saturday/Sunday.
    FlatByDayGroup {
        #[serde(default)]
        weekdays: Vec<Band>,
        #[serde(default)]
        weekends: Vec<Band>,
    },
    /// A progressive ladder, optionally overridden for Saturday and Sunday.
    ProgressiveLadder {
        weekdays: Ladder,
        #[serde(default)]
        saturday: Option<Ladder>,
        #[serde(default)]
        sunday: Option<Ladder>,
    },
}

impl RateRule {
    /// The ladder charging on `day`, if this is a ladder rule. Day-specific
    /// ladders take precedence over the generic weekday ladder.
    pub fn ladder_for(&self, day: DayType) -> Option<&Ladder> {
        match self {
            RateRule::ProgressiveLadder {
                weekdays,
                saturday,
                sunday,
            } => {
                let specific = match day {
                    DayType::Weekday => None,
                    DayType::Saturday => saturday.as_ref(),
                    DayType::Sunday => sunday.as_ref(),
                };
                Some(specific.unwrap_or(weekdays))
            }
            RateRule::Flat { .. } | RateRule::FlatByDayGroup { .. } => None,
        }
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RateRule::Flat { .. } => "flat",
            RateRule::FlatByDayGroup { .. } => "flat_by_day_group",
            RateRule::ProgressiveLadder { .. } => "progressive_ladder",
        }
    }

    fn intervals(&self) -> Vec<&TimeInterval> {
        match self {
            RateRule::Flat { bands } => bands.iter().map(Band::interval).collect(),
            RateRule::FlatByDayGroup { weekdays, weekends } => weekdays
                .iter()
                .chain(weekends)
                .map(Band::interval)
                .collect(),
            RateRule::ProgressiveLadder {
                weekdays,
                saturday,
                sunday,
            } => std::iter::once(weekdays)
                .chain(saturday)
                .chain(sunday)
                .map(Ladder::active_hours)
                .collect(),
        }
    }
}

// ── Free periods, free dates and grace ─────────────────────────────────────

/// Bands during which parking is free, whatever the rate rule says.
///
/// The period applies on a day whose type is in `days` or whose weekday is in
/// `weekdays` (`"monday"`, `"tue"`, ...). With both lists empty it applies
/// every day. Membership is decided by the calendar day of the moment, so an
/// overnight band such as `"17:00-08:00"` on Saturday also covers Saturday's
/// own early morning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreePeriod {
    pub times: Vec<TimeInterval>,
    #[serde(default)]
    pub days: Vec<DayType>,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FreePeriod {
    pub fn new(times: Vec<TimeInterval>, days: Vec<DayType>) -> Self {
        Self {
            times,
            days,
            weekdays: Vec::new(),
            description: None,
        }
    }

    /// Restrict the period to one more weekday.
    pub fn on_weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.push(weekday);
        self
    }

    pub fn covers(&self, date: NaiveDate, time: TimeOfDay) -> bool {
        let every_day = self.days.is_empty() && self.weekdays.is_empty();
        let on_day = every_day
            || self.days.contains(&DayType::of(date))
            || self.weekdays.contains(&date.weekday());
        on_day && self.times.iter().any(|interval| interval.contains(time))
    }
}

/// A calendar day, every year, on which the whole policy is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct FreeDate {
    month: u32,
    day: u32,
}

impl FreeDate {
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidPolicy`] if the pair is not a calendar
    /// day in a leap year.
    pub fn new(month: u32, day: u32) -> Result<Self, PricingError> {
        NaiveDate::from_ymd_opt(2000, month, day)
            .map(|_| Self { month, day })
            .ok_or_else(|| {
                PricingError::InvalidPolicy(format!("free date {month:02}-{day:02} does not exist"))
            })
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

impl TryFrom<String> for FreeDate {
    type Error = PricingError;

    /// Parse `"MM-DD"`, e.g. `"12-24"`.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        let invalid = || PricingError::InvalidPolicy(format!("free date '{s}': expected MM-DD"));
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;
        FreeDate::new(month, day)
    }
}

/// Waives the first chargeable hour of a stay that starts inside a weekly
/// window, such as Saturday 17:00 through Monday 08:00.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "GraceDocument")]
pub struct FreeFirstHourGrace {
    period: String,
    from: u32,
    until: u32,
    description: Option<String>,
}

#[derive(Deserialize)]
struct GraceDocument {
    period: String,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<GraceDocument> for FreeFirstHourGrace {
    type Error = PricingError;

    fn try_from(doc: GraceDocument) -> Result<Self, Self::Error> {
        let mut grace = FreeFirstHourGrace::parse(&doc.period)?;
        grace.description = doc.description;
        Ok(grace)
    }
}

impl FreeFirstHourGrace {
    /// Parse a window named `"<weekday>_<HH:MM>_to_<weekday>_<HH:MM>"`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidPolicy`] for an unknown shape or weekday,
    /// [`PricingError::MalformedTime`] for a bad time, and
    /// [`PricingError::DegenerateInterval`] when both ends coincide.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_engine::policy::FreeFirstHourGrace;
    ///
    /// let grace = FreeFirstHourGrace::parse("saturday_17:00_to_monday_08:00").unwrap();
    /// assert_eq!(grace.period(), "saturday_17:00_to_monday_08:00");
    /// ```
    pub fn parse(period: &str) -> Result<Self, PricingError> {
        let trimmed = period.trim();
        let invalid = || {
            PricingError::InvalidPolicy(format!(
                "grace period '{trimmed}': expected <weekday>_<HH:MM>_to_<weekday>_<HH:MM>"
            ))
        };

        let (from, until) = trimmed.split_once("_to_").ok_or_else(invalid)?;
        let from = parse_weekly_point(from).ok_or_else(invalid)??;
        let until = parse_weekly_point(until).ok_or_else(invalid)??;

        if from == until {
            return Err(PricingError::DegenerateInterval(format!(
                "grace period '{trimmed}': start and end are equal"
            )));
        }

        Ok(Self {
            period: trimmed.to_string(),
            from,
            until,
            description: None,
        })
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether a stay arriving at `arrival` gets its first chargeable hour waived.
    pub fn applies_to(&self, arrival: NaiveDateTime) -> bool {
        let at = week_minute(arrival.weekday(), TimeOfDay::of(arrival.time()).minutes());
        if self.from < self.until {
            at >= self.from && at < self.until
        } else {
            at >= self.from || at < self.until
        }
    }
}

/// Parse `"saturday_17:00"` into minutes since Monday 00:00. The outer
/// `Option` is `None` for a bad shape or weekday.
fn parse_weekly_point(s: &str) -> Option<Result<u32, PricingError>> {
    let (day, time) = s.split_once('_')?;
    let weekday: Weekday = day.parse().ok()?;
    Some(parse_time_of_day(time).map(|t| week_minute(weekday, t.minutes())))
}

fn week_minute(weekday: Weekday, minute_of_day: u32) -> u32 {
    weekday.num_days_from_monday() * MINUTES_PER_DAY + minute_of_day
}

// ── Billing granularity ─────────────────────────────────────────────────────

/// Rounding unit used to turn chargeable minutes into money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillingGranularity {
    #[default]
    #[serde(rename = "per_minute")]
    PerMinute,
    #[serde(rename = "per_started_hour")]
    PerStartedHour,
    #[serde(rename = "per_15_min")]
    Per15Min,
    #[serde(rename = "per_30_min")]
    Per30Min,
}

impl BillingGranularity {
    /// Length of one billing unit in minutes.
    pub fn unit_minutes(self) -> u32 {
        match self {
            BillingGranularity::PerMinute => 1,
            BillingGranularity::PerStartedHour => 60,
            BillingGranularity::Per15Min => 15,
            BillingGranularity::Per30Min => 30,
        }
    }
}

// ── PricingPolicy ───────────────────────────────────────────────────────────

/// Everything needed to price a stay at one parking area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricingPolicy {
    /// Currency label echoed on results; never converted.
    pub currency: String,
    #[serde(default)]
    pub billing: BillingGranularity,
    #[serde(default)]
    pub rates: Option<RateRule>,
    #[serde(default)]
    pub free_periods: Vec<FreePeriod>,
    #[serde(default)]
    pub free_dates: Vec<FreeDate>,
    #[serde(default)]
    pub free_first_hour: Option<FreeFirstHourGrace>,
}

impl PricingPolicy {
    /// A policy with the given rate rule, per-minute billing and no carve-outs.
    pub fn new(currency: impl Into<String>, rates: RateRule) -> Self {
        Self {
            currency: currency.into(),
            billing: BillingGranularity::default(),
            rates: Some(rates),
            free_periods: Vec::new(),
            free_dates: Vec::new(),
            free_first_hour: None,
        }
    }

    pub fn with_billing(mut self, billing: BillingGranularity) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_free_period(mut self, period: FreePeriod) -> Self {
        self.free_periods.push(period);
        self
    }

    pub fn with_free_date(mut self, date: FreeDate) -> Self {
        self.free_dates.push(date);
        self
    }

    pub fn with_free_first_hour(mut self, grace: FreeFirstHourGrace) -> Self {
        self.free_first_hour = Some(grace);
        self
    }

    /// The daily maximum of the rule set in force on `day`. A Saturday or
    /// Sunday ladder without its own maximum uses the weekdays ladder's.
    pub fn max_daily_for(&self, day: DayType) -> Option<Decimal> {
        let rule = self.rates.as_ref()?;
        rule.ladder_for(day)
            .and_then(Ladder::max_daily)
            .or_else(|| rule.ladder_for(DayType::Weekday).and_then(Ladder::max_daily))
    }

    /// The next minute of the day after `time` at which the applicable rate
    /// may change: the next full hour, or an earlier band or free-period
    /// boundary. Returns [`MINUTES_PER_DAY`] for the end of the day.
    pub(crate) fn next_boundary(&self, time: TimeOfDay) -> u32 {
        let now = time.minutes();
        let next_hour = (now / 60 + 1) * 60;

        let rule_intervals = self.rates.iter().flat_map(RateRule::intervals);
        let free_intervals = self.free_periods.iter().flat_map(|p| p.times.iter());

        rule_intervals
            .chain(free_intervals)
            .flat_map(TimeInterval::boundaries)
            .filter(|&b| b > now)
            .fold(next_hour, u32::min)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
