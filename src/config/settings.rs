// Settings - JSON configuration with per-section defaults

use crate::error::{CarillonError, Result};
use crate::striker::theme::ThemeOverride;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub striker: StrikerSettings,
    pub angelus: AngelusSettings,
    pub bell: BellSettings,
    pub liturgy: LiturgySettings,
    pub festive: FestiveSettings,
    pub jukebox: JukeboxSettings,
    pub control: ControlSettings,
    pub midi: MidiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikerSettings {
    pub priority: i32,
    /// Directory holding one sub-directory per theme
    pub basefolder: PathBuf,
    pub theme: String,
    /// Per-theme tempo/transpose
    pub themes: HashMap<String, ThemeOverride>,
    /// Seconds added to the firing time before deriving hour and quarter
    pub lead_time_secs: i64,
    /// Night mute window; `None` disables muting
    pub nightmuter_start: Option<String>,
    pub nightmuter_end: String,
}

impl Default for StrikerSettings {
    fn default() -> Self {
        Self {
            priority: -1,
            basefolder: PathBuf::from("../melodies/striker"),
            theme: "default".to_string(),
            themes: HashMap::new(),
            lead_time_secs: 7 * 60 + 30,
            nightmuter_start: Some("21:00".to_string()),
            nightmuter_end: "8:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngelusSettings {
    /// Comma separated `HH:MM` list; `None` disables the angelus
    pub times: Option<String>,
    pub path: PathBuf,
    pub transpose: i32,
    pub tempo: f64,
}

impl Default for AngelusSettings {
    fn default() -> Self {
        Self {
            times: None,
            path: PathBuf::from("../melodies/songs/Lourdes Lied.mid"),
            transpose: 0,
            tempo: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BellSettings {
    pub enabled: bool,
    /// Melody played on press; `None` only publishes the bell state
    pub melody: Option<PathBuf>,
    /// Seconds during which further presses are ignored
    pub playtime: f64,
    pub transpose: i32,
    pub tempo: f64,
    pub priority: i32,
}

impl Default for BellSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            melody: Some(PathBuf::from("../melodies/songs/Westminster Quarters.mid")),
            playtime: 10.0,
            transpose: 0,
            tempo: 1.0,
            priority: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiturgySettings {
    /// Silence Good Friday and Holy Saturday
    pub eastermute: bool,
    pub theme_solemnity: Option<String>,
    pub theme_feast: Option<String>,
    pub theme_memorial: Option<String>,
    pub theme_optional_memorial: Option<String>,
    pub theme_sunday: Option<String>,
    /// `HH:MM` after whose chime the seasonal antiphon plays
    pub antiphon: Option<String>,
    pub antiphon_christmas: PathBuf,
    pub antiphon_lent: PathBuf,
    pub antiphon_easter: PathBuf,
    pub antiphon_ordinary: PathBuf,
    pub antiphon_transpose: i32,
    pub antiphon_tempo: f64,
}

impl Default for LiturgySettings {
    fn default() -> Self {
        Self {
            eastermute: false,
            theme_solemnity: None,
            theme_feast: None,
            theme_memorial: None,
            theme_optional_memorial: None,
            theme_sunday: None,
            antiphon: Some("21:00".to_string()),
            antiphon_christmas: PathBuf::from("../melodies/songs/Alma Redemptoris Mater.mid"),
            antiphon_lent: PathBuf::from("../melodies/songs/Ave Regina caelorum.mid"),
            antiphon_easter: PathBuf::from("../melodies/songs/Regina caeli laetare.mid"),
            antiphon_ordinary: PathBuf::from("../melodies/songs/Salve Regina.mid"),
            antiphon_transpose: 0,
            antiphon_tempo: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FestiveSettings {
    pub festives: BTreeMap<String, FestiveEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestiveEntry {
    pub day: u32,
    pub month: u32,
    /// `HH:MM` of the chime the melody follows
    pub time: String,
    pub melody: PathBuf,
    #[serde(default)]
    pub transpose: i32,
    #[serde(default = "default_tempo")]
    pub tempo: f64,
}

fn default_tempo() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JukeboxSettings {
    pub priority: i32,
    pub basefolder: PathBuf,
}

impl Default for JukeboxSettings {
    fn default() -> Self {
        Self {
            priority: 5,
            basefolder: PathBuf::from("../melodies/songs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub enabled: bool,
    /// Prefix of every topic, without trailing slash
    pub basetopic: String,
    /// Last volume set through the controller
    pub volume: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            basetopic: "carillon".to_string(),
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Output port name; `None` picks the first port
    pub port: Option<String>,
    pub connect_attempts: u32,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            port: None,
            connect_attempts: 10,
        }
    }
}

impl Settings {
    /// Config file to use: the explicit path, `./config.json`, then the user
    /// config directory
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("carillon").join(CONFIG_FILE_NAME))
            .filter(|path| path.is_file())
    }

    /// Read settings from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let text = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text).map_err(|e| {
            CarillonError::Config(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn load(explicit: Option<&Path>) -> Result<Settings> {
        match Self::locate(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Settings::default()),
        }
    }

    /// Write pretty JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }
}
