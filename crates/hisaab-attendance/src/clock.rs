//! Time source for the ledgers.
//!
//! Services never call `Utc::now()` directly so tests can pin the instant a
//! check-in happens.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()` in the business-local offset.
    fn today(&self, offset: FixedOffset) -> NaiveDate {
        self.now().with_timezone(&offset).date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_day_follows_offset() {
        // 20:30 UTC on the 10th is already the 11th in UTC+5
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 20, 30, 0).unwrap());

        let utc = FixedOffset::east_opt(0).unwrap();
        let pkt = FixedOffset::east_opt(5 * 3600).unwrap();
        assert_eq!(clock.today(utc), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(clock.today(pkt), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

        clock.advance(Duration::hours(4));
        assert_eq!(clock.today(utc), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }
}
