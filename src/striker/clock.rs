// Wall clock abstraction and quarter-hour arithmetic

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use std::sync::Mutex;

/// Local wall-clock time source
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut current) = self.now.lock() {
            *current = now;
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut current) = self.now.lock() {
            *current += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|e| *e.into_inner())
    }
}

pub fn quarter_length() -> TimeDelta {
    TimeDelta::minutes(15)
}

/// Latest quarter boundary at or before `t`
pub fn quarter_floor(t: NaiveDateTime) -> NaiveDateTime {
    let past_boundary = i64::from(t.minute() % 15) * 60 + i64::from(t.second());
    t - TimeDelta::seconds(past_boundary) - TimeDelta::nanoseconds(i64::from(t.nanosecond()))
}

/// First quarter boundary strictly after `t`
pub fn next_quarter(t: NaiveDateTime) -> NaiveDateTime {
    quarter_floor(t) + quarter_length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_quarter_floor() {
        assert_eq!(quarter_floor(at(12, 0, 0)), at(12, 0, 0));
        assert_eq!(quarter_floor(at(12, 14, 59)), at(12, 0, 0));
        assert_eq!(quarter_floor(at(12, 15, 0)), at(12, 15, 0));
        assert_eq!(quarter_floor(at(23, 59, 59)), at(23, 45, 0));
    }

    #[test]
    fn test_next_quarter_is_strictly_after() {
        assert_eq!(next_quarter(at(12, 0, 0)), at(12, 15, 0));
        assert_eq!(next_quarter(at(12, 44, 30)), at(12, 45, 0));
        assert_eq!(
            next_quarter(at(23, 50, 0)),
            NaiveDate::from_ymd_opt(2024, 3, 11)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(at(8, 0, 0));
        clock.advance(TimeDelta::minutes(20));
        assert_eq!(clock.now(), at(8, 20, 0));
        clock.set(at(9, 0, 0));
        assert_eq!(clock.now(), at(9, 0, 0));
    }
}
