// Jukebox - plays songs from a folder on request

use super::bus::{MessageBus, TopicHandler};
use crate::carillon::Carillon;
use crate::config::JukeboxSettings;
use crate::error::{CarillonError, Result};
use crate::melody::Melody;
use crate::melody::sequence::MAX_TRANSPOSE;
use crate::striker::theme::is_plain_name;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{info, warn};

const PREFIX: &str = "jukebox/";
const TOPICS: [&str; 5] = ["play", "stop", "list/get", "transpose/set", "transpose/get"];

pub struct Jukebox {
    carillon: Carillon,
    bus: Arc<dyn MessageBus>,
    basefolder: PathBuf,
    priority: i32,
    transpose: AtomicI32,
}

impl Jukebox {
    pub fn new(
        carillon: Carillon,
        bus: Arc<dyn MessageBus>,
        basefolder: impl Into<PathBuf>,
        priority: i32,
    ) -> Self {
        Self {
            carillon,
            bus,
            basefolder: basefolder.into(),
            priority,
            transpose: AtomicI32::new(0),
        }
    }

    pub fn from_settings(
        carillon: Carillon,
        bus: Arc<dyn MessageBus>,
        settings: &JukeboxSettings,
    ) -> Self {
        Self::new(carillon, bus, settings.basefolder.clone(), settings.priority)
    }

    /// Names (without `.mid`) of every song in the folder, sorted
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.basefolder) else {
            return Vec::new();
        };

        let mut songs: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "mid"))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect();
        songs.sort();
        songs
    }

    /// Play `song` at the jukebox priority; `Ok(false)` when outranked
    pub fn play(&self, song: &str) -> Result<bool> {
        if !is_plain_name(song) {
            return Err(CarillonError::InvalidParameter(format!(
                "invalid song name '{}'",
                song
            )));
        }
        let path = self.basefolder.join(format!("{}.mid", song));
        let melody = Melody::from_asset(&path)?.with_transpose(self.transpose())?;

        let accepted = self.carillon.play(melody, self.priority);
        info!("Jukebox '{}' {}", song, if accepted { "playing" } else { "outranked" });
        Ok(accepted)
    }

    pub fn transpose(&self) -> i32 {
        self.transpose.load(Ordering::Relaxed)
    }

    pub fn set_transpose(&self, semitones: i32) -> Result<()> {
        if semitones.abs() > MAX_TRANSPOSE {
            return Err(CarillonError::InvalidParameter(format!(
                "transpose {} out of range",
                semitones
            )));
        }
        self.transpose.store(semitones, Ordering::Relaxed);
        Ok(())
    }

    fn publish_transpose(&self) {
        self.bus
            .publish("jukebox/transpose", self.transpose().to_string().as_bytes());
    }
}

impl TopicHandler for Jukebox {
    fn topics(&self) -> Vec<String> {
        TOPICS.iter().map(|t| format!("{}{}", PREFIX, t)).collect()
    }

    fn handle(&self, topic: &str, payload: &[u8]) {
        let topic = topic.strip_prefix(PREFIX).unwrap_or(topic);
        let payload = String::from_utf8_lossy(payload);

        match topic {
            "play" => {
                if let Err(e) = self.play(payload.trim()) {
                    warn!("Jukebox: {}", e);
                }
            }
            "stop" => {
                if let Err(e) = self.carillon.stop() {
                    warn!("Stop reported: {}", e);
                }
            }
            "list/get" => {
                self.bus
                    .publish("jukebox/list", self.list().join("\n").as_bytes());
            }
            "transpose/set" => {
                match payload.trim().parse::<i32>() {
                    Ok(semitones) => {
                        if let Err(e) = self.set_transpose(semitones) {
                            warn!("Jukebox: {}", e);
                        }
                    }
                    Err(_) => warn!("Ignoring malformed transpose '{}'", payload),
                }
                self.publish_transpose();
            }
            "transpose/get" => self.publish_transpose(),
            other => warn!("Unknown jukebox topic '{}'", other),
        }
    }
}
