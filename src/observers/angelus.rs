// Angelus - appends the Angelus melody at configured times

use super::append_song;
use crate::config::{AngelusSettings, parse_quarter_list};
use crate::error::Result;
use crate::melody::Melody;
use crate::striker::Striker;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Angelus {
    times: Vec<(u32, u32)>,
    path: PathBuf,
    transpose: i32,
    tempo: f64,
}

impl Angelus {
    pub fn new(times: Vec<(u32, u32)>, path: impl Into<PathBuf>, transpose: i32, tempo: f64) -> Self {
        Self {
            times,
            path: path.into(),
            transpose,
            tempo,
        }
    }

    /// `None` when no times are configured
    pub fn from_settings(settings: &AngelusSettings) -> Result<Option<Self>> {
        let Some(times) = settings.times.as_deref() else {
            return Ok(None);
        };
        let times = parse_quarter_list(times)?;
        if times.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(
            times,
            settings.path.clone(),
            settings.transpose,
            settings.tempo,
        )))
    }

    pub fn observe(&self, melody: Melody, hour: u32, quarter: u32) -> Option<Melody> {
        if !self.times.contains(&(hour, quarter)) {
            return Some(melody);
        }
        Some(append_song(melody, &self.path, self.transpose, self.tempo))
    }

    pub fn register(self, striker: &Striker) {
        striker.subscribe(move |melody, hour, quarter| self.observe(melody, hour, quarter));
    }
}
