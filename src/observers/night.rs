// Night muter - silences the striker overnight

use crate::config::{StrikerSettings, parse_quarter};
use crate::error::Result;
use crate::melody::Melody;
use crate::striker::Striker;

/// Vetoes every tick strictly between `start` and `end`
///
/// The window may wrap past midnight. The ticks at `start` and `end`
/// themselves still sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightMuter {
    start: (u32, u32),
    end: (u32, u32),
}

impl NightMuter {
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self { start, end }
    }

    /// `None` when the night window is disabled
    pub fn from_settings(settings: &StrikerSettings) -> Result<Option<Self>> {
        let Some(start) = settings.nightmuter_start.as_deref() else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            parse_quarter(start)?,
            parse_quarter(&settings.nightmuter_end)?,
        )))
    }

    pub fn is_night(&self, hour: u32, quarter: u32) -> bool {
        let now = (hour, quarter);
        if self.start <= self.end {
            self.start < now && now < self.end
        } else {
            self.start < now || now < self.end
        }
    }

    pub fn observe(&self, melody: Melody, hour: u32, quarter: u32) -> Option<Melody> {
        (!self.is_night(hour, quarter)).then_some(melody)
    }

    pub fn register(self, striker: &Striker) {
        striker.subscribe(move |melody, hour, quarter| self.observe(melody, hour, quarter));
    }
}
