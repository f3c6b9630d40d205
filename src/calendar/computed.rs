// Computed calendar - derives seasons and major days from the date alone

use super::{Calendar, Rank, RankEvent, Season};
use crate::striker::clock::{Clock, SystemClock};
use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use std::sync::Arc;

/// Easter Sunday of the Gregorian calendar (Gauss)
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = (19 * a + b - b / 4 - ((b - (b + 8) / 25 + 1) / 3) + 15).rem_euclid(30);
    let e = (32 + 2 * (b % 4) + 2 * (c / 4) - d - (c % 4)).rem_euclid(7);
    let f = d + e - 7 * ((a + 11 * d + 22 * e) / 451) + 114;

    NaiveDate::from_ymd_opt(year, (f / 31) as u32, (f % 31 + 1) as u32).unwrap_or_default()
}

/// Calendar without an external directory
///
/// Seasons follow the date rules; named days are limited to Sundays,
/// Christmas, Easter and Pentecost.
#[derive(Clone)]
pub struct ComputedCalendar {
    clock: Arc<dyn Clock>,
}

impl ComputedCalendar {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for ComputedCalendar {
    fn default() -> Self {
        Self::new()
    }
}

fn days(n: i64) -> TimeDelta {
    TimeDelta::days(n)
}

fn iso_weekday(date: NaiveDate) -> i64 {
    i64::from(date.weekday().number_from_monday())
}

impl Calendar for ComputedCalendar {
    fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    fn season_on(&self, date: NaiveDate) -> Season {
        let year = date.year();

        // Advent opens the Christmas season
        if let Some(christmas) = NaiveDate::from_ymd_opt(year, 12, 25) {
            let advent = christmas - days(21 + iso_weekday(christmas));
            if date >= advent {
                return Season::Christmas;
            }
        }

        // ...which closes with the Baptism of the Lord
        if let Some(epiphany) = NaiveDate::from_ymd_opt(year, 1, 6) {
            let baptism = epiphany + days(7 - iso_weekday(epiphany) % 7);
            if date <= baptism {
                return Season::Christmas;
            }
        }

        let easter = self.easter_date(year);
        let ash_wednesday = easter - days(46);
        if date >= ash_wednesday && date < easter {
            return Season::Lent;
        }

        let pentecost = easter + days(49);
        if date >= easter && date <= pentecost {
            return Season::Easter;
        }

        Season::Ordinary
    }

    fn rank_event_on(&self, date: NaiveDate) -> RankEvent {
        let easter = self.easter_date(date.year());

        if date == easter {
            return RankEvent::new("Easter Sunday", Rank::Solemnity);
        }
        if date == easter + days(49) {
            return RankEvent::new("Pentecost Sunday", Rank::Solemnity);
        }
        if date.month() == 12 && date.day() == 25 {
            return RankEvent::new("Christmas", Rank::Solemnity);
        }
        if date.weekday() == Weekday::Sun {
            return RankEvent::new("Sunday", Rank::None);
        }
        RankEvent::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::striker::clock::ManualClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_easter_dates() {
        assert_eq!(easter_sunday(2000), date(2000, 4, 23));
        assert_eq!(easter_sunday(2019), date(2019, 4, 21));
        assert_eq!(easter_sunday(2024), date(2024, 3, 31));
        assert_eq!(easter_sunday(2025), date(2025, 4, 20));
        assert_eq!(easter_sunday(2038), date(2038, 4, 25));
    }

    #[test]
    fn test_seasons_2024() {
        let calendar = ComputedCalendar::new();

        assert_eq!(calendar.season_on(date(2024, 1, 3)), Season::Christmas);
        assert_eq!(calendar.season_on(date(2024, 1, 20)), Season::Ordinary);
        assert_eq!(calendar.season_on(date(2024, 2, 13)), Season::Ordinary);
        assert_eq!(calendar.season_on(date(2024, 2, 14)), Season::Lent);
        assert_eq!(calendar.season_on(date(2024, 3, 30)), Season::Lent);
        assert_eq!(calendar.season_on(date(2024, 3, 31)), Season::Easter);
        assert_eq!(calendar.season_on(date(2024, 5, 19)), Season::Easter);
        assert_eq!(calendar.season_on(date(2024, 5, 20)), Season::Ordinary);
        // First Sunday of Advent 2024
        assert_eq!(calendar.season_on(date(2024, 11, 30)), Season::Ordinary);
        assert_eq!(calendar.season_on(date(2024, 12, 1)), Season::Christmas);
    }

    #[test]
    fn test_rank_events() {
        let calendar = ComputedCalendar::new();

        assert_eq!(calendar.rank_event_on(date(2024, 3, 31)).rank, Rank::Solemnity);
        assert_eq!(calendar.rank_event_on(date(2024, 12, 25)).rank, Rank::Solemnity);
        assert!(calendar.rank_event_on(date(2024, 6, 2)).is_sunday());
        assert_eq!(calendar.rank_event_on(date(2024, 6, 3)), RankEvent::default());
    }

    #[test]
    fn test_current_follows_clock() {
        let clock = Arc::new(ManualClock::new(
            date(2024, 3, 20).and_hms_opt(12, 0, 0).unwrap(),
        ));
        let calendar = ComputedCalendar::with_clock(clock);

        assert_eq!(calendar.today(), date(2024, 3, 20));
        assert_eq!(calendar.current_season(), Season::Lent);
    }
}
