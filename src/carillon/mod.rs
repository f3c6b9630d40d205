// Carillon - priority-arbitrated melody player

mod playback;
pub mod player;

pub use player::Carillon;
