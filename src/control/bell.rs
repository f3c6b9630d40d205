// Bell - a push button that rings a melody and reports its state

use super::bus::{MessageBus, TopicHandler};
use crate::carillon::Carillon;
use crate::config::BellSettings;
use crate::observers::load_song;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Driven by whatever polls the physical button
pub struct Bell {
    carillon: Carillon,
    bus: Option<Arc<dyn MessageBus>>,
    melody: Option<PathBuf>,
    /// Presses within this time after a ring are ignored
    playtime: Duration,
    transpose: i32,
    tempo: f64,
    priority: i32,
    last_played: Mutex<Option<Instant>>,
    pressed: AtomicBool,
}

impl Bell {
    pub fn from_settings(
        carillon: Carillon,
        bus: Option<Arc<dyn MessageBus>>,
        settings: &BellSettings,
    ) -> Self {
        let bell = Self {
            carillon,
            bus,
            melody: settings.melody.clone(),
            playtime: Duration::try_from_secs_f64(settings.playtime.max(0.0))
                .unwrap_or(Duration::MAX),
            transpose: settings.transpose,
            tempo: settings.tempo,
            priority: settings.priority,
            last_played: Mutex::new(None),
            pressed: AtomicBool::new(false),
        };
        bell.publish_state(false);
        bell
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }

    /// Button went down; returns whether a melody was started
    pub fn press(&self) -> bool {
        if self.pressed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.publish_state(true);
        self.ring()
    }

    /// Button went up
    pub fn release(&self) {
        if self.pressed.swap(false, Ordering::SeqCst) {
            self.publish_state(false);
        }
    }

    /// Play the bell melody unless it rang within the last `playtime`
    pub fn ring(&self) -> bool {
        let Some(path) = &self.melody else {
            return false;
        };

        {
            let Ok(mut last) = self.last_played.lock() else {
                return false;
            };
            if last.is_some_and(|at| at.elapsed() < self.playtime) {
                debug!("Bell still cooling down");
                return false;
            }
            *last = Some(Instant::now());
        }

        match load_song(path, self.transpose, self.tempo) {
            Ok(melody) => self.carillon.play(melody, self.priority),
            Err(e) => {
                warn!("Bell melody unavailable: {}", e);
                false
            }
        }
    }

    fn publish_state(&self, pressed: bool) {
        if let Some(bus) = &self.bus {
            bus.publish("bell/state", if pressed { b"1" } else { b"0" });
        }
    }
}

/// Lets a button bridge report edges over the bus
impl TopicHandler for Bell {
    fn topics(&self) -> Vec<String> {
        vec!["bell/press".to_string(), "bell/release".to_string()]
    }

    fn handle(&self, topic: &str, _payload: &[u8]) {
        match topic {
            "bell/press" => {
                self.press();
            }
            "bell/release" => self.release(),
            other => warn!("Unknown bell topic '{}'", other),
        }
    }
}
