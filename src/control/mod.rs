// Control - bus-driven handlers and the bell button

pub mod bell;
pub mod bus;
pub mod controller;
pub mod jukebox;

pub use bell::Bell;
pub use bus::{LocalBus, MessageBus, TopicHandler, TopicRouter};
pub use controller::ControlHandler;
pub use jukebox::Jukebox;
