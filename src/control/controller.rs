// Control handler - volume, stop, theme and status over the bus

use super::bus::{MessageBus, TopicHandler};
use crate::config::Settings;
use crate::striker::Striker;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const PREFIX: &str = "control/";
const TOPICS: [&str; 7] = [
    "volume/get",
    "volume/set",
    "stop",
    "theme/get",
    "theme/set",
    "theme/list/get",
    "status/get",
];

pub struct ControlHandler {
    striker: Striker,
    bus: Arc<dyn MessageBus>,
    /// Settings file kept in sync with volume and theme changes
    persist: Option<Mutex<(PathBuf, Settings)>>,
}

impl ControlHandler {
    pub fn new(striker: Striker, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            striker,
            bus,
            persist: None,
        }
    }

    pub fn with_persistence(mut self, path: PathBuf, settings: Settings) -> Self {
        self.persist = Some(Mutex::new((path, settings)));
        self
    }

    pub fn publish_volume(&self) {
        let volume = self.striker.carillon().volume();
        self.bus.publish("control/volume", volume.to_string().as_bytes());
    }

    pub fn publish_theme(&self) {
        self.bus
            .publish("control/theme", self.striker.theme().as_bytes());
    }

    pub fn publish_theme_list(&self) {
        let themes = self.striker.library().list().join("\n");
        self.bus.publish("control/theme/list", themes.as_bytes());
    }

    pub fn publish_status(&self) {
        let carillon = self.striker.carillon();
        let status = json!({
            "playing": carillon.is_playing(),
            "priority": carillon.current_priority(),
            "volume": carillon.volume(),
            "theme": self.striker.theme(),
            "last_error": carillon.last_error(),
        });
        self.bus
            .publish("control/status", status.to_string().as_bytes());
    }

    fn set_volume(&self, payload: &str) {
        let Ok(volume) = payload.trim().parse::<f32>() else {
            warn!("Ignoring malformed volume '{}'", payload);
            return;
        };
        if let Err(e) = self.striker.carillon().set_volume(volume) {
            warn!("Could not set volume: {}", e);
            return;
        }
        let volume = self.striker.carillon().volume();
        info!("Volume set to {:.2}", volume);
        self.save(|settings| settings.control.volume = volume);
    }

    fn set_theme(&self, payload: &str) {
        let theme = payload.trim();
        if self.striker.set_theme(theme) {
            self.save(|settings| settings.striker.theme = theme.to_string());
        }
    }

    fn save(&self, update: impl FnOnce(&mut Settings)) {
        let Some(persist) = &self.persist else {
            return;
        };
        let Ok(mut guard) = persist.lock() else {
            return;
        };
        let (path, settings) = &mut *guard;
        update(settings);
        if let Err(e) = settings.save(path) {
            warn!("Could not save settings: {}", e);
        }
    }
}

impl TopicHandler for ControlHandler {
    fn topics(&self) -> Vec<String> {
        TOPICS.iter().map(|t| format!("{}{}", PREFIX, t)).collect()
    }

    fn handle(&self, topic: &str, payload: &[u8]) {
        let topic = topic.strip_prefix(PREFIX).unwrap_or(topic);
        let payload = String::from_utf8_lossy(payload);

        match topic {
            "volume/get" => self.publish_volume(),
            "volume/set" => {
                self.set_volume(&payload);
                self.publish_volume();
            }
            "stop" => {
                if let Err(e) = self.striker.carillon().stop() {
                    warn!("Stop reported: {}", e);
                }
            }
            "theme/get" => self.publish_theme(),
            "theme/set" => {
                self.set_theme(&payload);
                self.publish_theme();
            }
            "theme/list/get" => self.publish_theme_list(),
            "status/get" => self.publish_status(),
            other => warn!("Unknown control topic '{}'", other),
        }
    }
}
