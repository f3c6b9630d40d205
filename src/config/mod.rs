// Configuration - settings file and time parsing

pub mod settings;
pub mod time;

pub use settings::{
    AngelusSettings, BellSettings, ControlSettings, FestiveEntry, FestiveSettings,
    JukeboxSettings, LiturgySettings, MidiSettings, Settings, StrikerSettings,
};
pub use time::{parse_quarter, parse_quarter_list};
