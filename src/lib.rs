// Carillon - Library exports for the daemon and tests

pub mod calendar;
pub mod carillon;
pub mod config;
pub mod connection;
pub mod control;
pub mod error;
pub mod melody;
pub mod messaging;
pub mod midi;
pub mod observers;
pub mod striker;

// Re-export commonly used types for convenience
pub use carillon::Carillon;
pub use config::Settings;
pub use error::{CarillonError, Result};
pub use melody::Melody;
pub use messaging::channels::create_notification_channel;
pub use midi::event::{EventKind, NoteEvent};
pub use midi::output::{MemoryOutput, MidirOutput, OutputDevice};
pub use striker::{StrikeOutcome, Striker, StrikerConfig, ThemeLibrary};
