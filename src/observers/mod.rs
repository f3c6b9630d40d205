// Built-in striker observers

pub mod angelus;
pub mod festive;
pub mod liturgy;
pub mod night;

pub use angelus::Angelus;
pub use festive::Festive;
pub use liturgy::Liturgy;
pub use night::NightMuter;

use crate::error::Result;
use crate::melody::Melody;
use std::path::Path;
use tracing::warn;

/// Load a song with its own tempo and transpose
pub fn load_song(path: &Path, transpose: i32, tempo: f64) -> Result<Melody> {
    Melody::from_asset(path)?
        .with_transpose(transpose)?
        .with_tempo(tempo)
}

/// Append a song to the tick's melody; on failure the tick is left as is
pub(crate) fn append_song(melody: Melody, path: &Path, transpose: i32, tempo: f64) -> Melody {
    match load_song(path, transpose, tempo) {
        Ok(song) => melody + song,
        Err(e) => {
            warn!("Could not append {}: {}", path.display(), e);
            melody
        }
    }
}
