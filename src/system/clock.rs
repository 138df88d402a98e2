//! Wall-clock time for ledger timestamps
//!
//! Workflow timers run on `embassy_time::Instant`; only saved records need a calendar date.

use chrono::{Local, NaiveDateTime};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall time, so the daily ledger rolls over at local midnight. On target this is
/// whatever SNTP or the RTC has set, interpreted through `TZ`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock() {
        let noon = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let clock = FixedClock::new(noon);
        assert_eq!(clock.now(), noon);

        let later = noon + chrono::Duration::hours(13);
        clock.set(later);
        assert_eq!(clock.now().date(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn test_system_clock_reads_local_time() {
        let before = Local::now().naive_local();
        let now = SystemClock.now();
        let after = Local::now().naive_local();
        assert!(before <= now && now <= after);
        assert!(now.date() > NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }
}
