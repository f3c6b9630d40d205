// Liturgical calendar - seasons, day ranks and the date of Easter

pub mod computed;

pub use computed::{ComputedCalendar, easter_sunday};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Ordinary,
    Christmas,
    Lent,
    Easter,
}

/// Rank of a day, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Rank {
    #[default]
    None,
    OptionalMemorial,
    Memorial,
    Feast,
    Solemnity,
}

impl Rank {
    /// Parse the single-letter rank codes used by directory services
    /// (`H`, `F`, `G`, `g`, empty)
    pub fn from_code(code: &str) -> Option<Rank> {
        match code {
            "H" => Some(Rank::Solemnity),
            "F" => Some(Rank::Feast),
            "G" => Some(Rank::Memorial),
            "g" => Some(Rank::OptionalMemorial),
            "" => Some(Rank::None),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::None => "",
            Rank::OptionalMemorial => "Optional Memorial",
            Rank::Memorial => "Memorial",
            Rank::Feast => "Feast",
            Rank::Solemnity => "Solemnity",
        };
        f.write_str(name)
    }
}

/// The principal celebration of a day
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RankEvent {
    pub title: String,
    pub rank: Rank,
}

impl RankEvent {
    pub fn new(title: impl Into<String>, rank: Rank) -> Self {
        Self {
            title: title.into(),
            rank,
        }
    }

    pub fn is_sunday(&self) -> bool {
        self.title.to_lowercase().contains("sunday")
    }
}

/// Calendar lookups
///
/// Network-backed directories live outside this crate and plug in by
/// implementing this trait.
pub trait Calendar: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn season_on(&self, date: NaiveDate) -> Season;

    fn rank_event_on(&self, date: NaiveDate) -> RankEvent;

    fn easter_date(&self, year: i32) -> NaiveDate {
        easter_sunday(year)
    }

    fn current_season(&self) -> Season {
        self.season_on(self.today())
    }

    fn current_rank_event(&self) -> RankEvent {
        self.rank_event_on(self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_codes() {
        assert_eq!(Rank::from_code("H"), Some(Rank::Solemnity));
        assert_eq!(Rank::from_code("g"), Some(Rank::OptionalMemorial));
        assert_eq!(Rank::from_code(""), Some(Rank::None));
        assert_eq!(Rank::from_code("x"), None);
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::Solemnity > Rank::Feast);
        assert!(Rank::Memorial > Rank::OptionalMemorial);
        assert!(Rank::OptionalMemorial > Rank::None);
    }

    #[test]
    fn test_sunday_detection() {
        assert!(RankEvent::new("Third Sunday of Advent", Rank::None).is_sunday());
        assert!(!RankEvent::new("St. Nicholas", Rank::OptionalMemorial).is_sunday());
    }
}
