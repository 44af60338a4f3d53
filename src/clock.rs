use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

/// Offset of Nepal Standard Time (UTC+05:45), the default attendance zone.
pub const NEPAL_OFFSET_MINUTES: i32 = 5 * 60 + 45;

/// Clock
///
/// Source of the current instant. Handlers never call `Utc::now()` directly so
/// that attendance and leave flows can be tested at fixed points in time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// SystemClock
///
/// The production clock, backed by the OS wall clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// FixedClock
///
/// A clock frozen at one instant, for tests.
#[derive(Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub type ClockState = Arc<dyn Clock>;

/// Builds a UTC offset from whole minutes. Returns `None` when the offset is
/// outside +/-24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// The calendar day `instant` falls on in the zone described by `offset`.
/// This is the key of the one-row-per-employee-per-day attendance rule.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Hours between check-in and check-out, rounded to two decimals.
/// A check-out earlier than the check-in counts as zero.
pub fn hours_worked(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let seconds = (check_out - check_in).num_seconds().max(0) as f64;
    round2(seconds / 3600.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First day of the seven-day window ending on `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(6)
}

/// January 1st of the year `today` belongs to.
pub fn year_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_yo_opt(chrono::Datelike::year(&today), 1).unwrap_or(today)
}
