// Striker - quarter-hour scheduling, themes and the observer pipeline

pub mod clock;
pub mod observer;
pub mod scheduler;
pub mod theme;

pub use clock::{Clock, ManualClock, SystemClock};
pub use observer::{Observer, ObserverChain};
pub use scheduler::{StrikeOutcome, Striker, StrikerConfig, StrikerHandle};
pub use theme::{AssetKind, ThemeLibrary, ThemeOverride};
