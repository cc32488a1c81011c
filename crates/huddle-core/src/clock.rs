//! Injected time source.
//!
//! "Today" is never caller-supplied: lock-window and staleness rules read
//! it from a [`Clock`] so they are deterministically testable.

use chrono::{DateTime, NaiveDate, Utc};

/// Capability trait for the current date and time.
pub trait Clock: Send + Sync {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;

    /// Current instant, used for record timestamps.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock pinned to a single date, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now(&self) -> DateTime<Utc> {
        self.0
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }
}

/// Deterministic clock pinned to a date whose `now()` advances one second
/// per call, so records written in one test carry distinct, ordered
/// timestamps.
#[derive(Debug)]
pub struct TickingClock {
    date: NaiveDate,
    ticks: std::sync::atomic::AtomicI64,
}

impl TickingClock {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ticks: std::sync::atomic::AtomicI64::new(0),
        }
    }
}

impl Clock for TickingClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now(&self) -> DateTime<Utc> {
        let tick = self
            .ticks
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.date
            .and_hms_opt(8, 0, 0)
            .unwrap_or_default()
            .and_utc()
            + chrono::Duration::seconds(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, TickingClock};
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_pins_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let clock = FixedClock(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
    }

    #[test]
    fn ticking_clock_orders_successive_calls() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let clock = TickingClock::new(date);
        let first = clock.now();
        let second = clock.now();
        assert!(second > first);
        assert_eq!(clock.today(), date);
    }
}
