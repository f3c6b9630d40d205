// Festive - extra melodies on fixed calendar days

use super::append_song;
use crate::config::{FestiveSettings, parse_quarter};
use crate::error::Result;
use crate::melody::Melody;
use crate::striker::{Clock, Striker};
use chrono::Datelike;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct FestiveDay {
    pub name: String,
    pub day: u32,
    pub month: u32,
    pub time: (u32, u32),
    pub melody: PathBuf,
    pub transpose: i32,
    pub tempo: f64,
}

pub struct Festive {
    days: Vec<FestiveDay>,
    clock: Arc<dyn Clock>,
}

impl Festive {
    pub fn new(days: Vec<FestiveDay>, clock: Arc<dyn Clock>) -> Self {
        Self { days, clock }
    }

    pub fn from_settings(settings: &FestiveSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        let days = settings
            .festives
            .iter()
            .map(|(name, entry)| {
                Ok(FestiveDay {
                    name: name.clone(),
                    day: entry.day,
                    month: entry.month,
                    time: parse_quarter(&entry.time)?,
                    melody: entry.melody.clone(),
                    transpose: entry.transpose,
                    tempo: entry.tempo,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(days, clock))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Appends the melody of every entry matching today and this tick
    pub fn observe(&self, melody: Melody, hour: u32, quarter: u32) -> Option<Melody> {
        let today = self.clock.now().date();
        let melody = self
            .days
            .iter()
            .filter(|d| d.day == today.day() && d.month == today.month())
            .filter(|d| d.time == (hour, quarter))
            .fold(melody, |melody, d| {
                append_song(melody, &d.melody, d.transpose, d.tempo)
            });
        Some(melody)
    }

    pub fn register(self, striker: &Striker) {
        striker.subscribe(move |melody, hour, quarter| self.observe(melody, hour, quarter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FestiveEntry;
    use crate::midi::event::NoteEvent;
    use crate::midi::file;
    use crate::striker::ManualClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn song(dir: &TempDir, name: &str, note: u8) -> PathBuf {
        let path = dir.path().join(name);
        file::write(&[NoteEvent::note_on(0.0, note, 100)], &path).unwrap();
        path
    }

    fn clock_on(month: u32, day: u32) -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, month, day)
                .unwrap()
                .and_hms_opt(17, 55, 0)
                .unwrap(),
        ))
    }

    fn festive_day(name: &str, time: (u32, u32), melody: PathBuf) -> FestiveDay {
        FestiveDay {
            name: name.to_string(),
            day: 25,
            month: 12,
            time,
            melody,
            transpose: 0,
            tempo: 1.0,
        }
    }

    fn notes(melody: &Melody) -> Vec<u8> {
        melody.effective_events().filter_map(|e| e.kind.note()).collect()
    }

    #[test]
    fn test_matching_day_and_time_appends() {
        let dir = TempDir::new().unwrap();
        let festive = Festive::new(
            vec![festive_day("christmas", (18, 0), song(&dir, "adeste.mid", 72))],
            clock_on(12, 25),
        );

        assert_eq!(notes(&festive.observe(Melody::new(), 18, 0).unwrap()), vec![72]);
        assert!(festive.observe(Melody::new(), 18, 1).unwrap().is_empty());
    }

    #[test]
    fn test_other_days_pass_through() {
        let dir = TempDir::new().unwrap();
        let festive = Festive::new(
            vec![festive_day("christmas", (18, 0), song(&dir, "adeste.mid", 72))],
            clock_on(12, 24),
        );

        assert!(festive.observe(Melody::new(), 18, 0).unwrap().is_empty());
    }

    #[test]
    fn test_every_matching_entry_is_appended() {
        let dir = TempDir::new().unwrap();
        let festive = Festive::new(
            vec![
                festive_day("morning", (9, 0), song(&dir, "a.mid", 70)),
                festive_day("evening", (18, 0), song(&dir, "b.mid", 71)),
                festive_day("evening2", (18, 0), song(&dir, "c.mid", 72)),
            ],
            clock_on(12, 25),
        );

        assert_eq!(
            notes(&festive.observe(Melody::new(), 18, 0).unwrap()),
            vec![71, 72]
        );
    }

    #[test]
    fn test_from_settings_parses_times() {
        let mut settings = FestiveSettings::default();
        settings.festives.insert(
            "christmas".to_string(),
            FestiveEntry {
                day: 25,
                month: 12,
                time: "18:00".to_string(),
                melody: PathBuf::from("adeste.mid"),
                transpose: 0,
                tempo: 1.0,
            },
        );
        let festive = Festive::from_settings(&settings, clock_on(1, 1)).unwrap();
        assert_eq!(festive.days[0].time, (18, 0));

        settings.festives.get_mut("christmas").unwrap().time = "evening".to_string();
        assert!(Festive::from_settings(&settings, clock_on(1, 1)).is_err());
    }
}
