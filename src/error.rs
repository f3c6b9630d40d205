// Error types shared by the melody, player and striker layers

use std::path::PathBuf;

/// Errors raised by the carillon core.
///
/// None of these is fatal to the process: asset errors degrade a single
/// tick, device errors abort the current playback only.
#[derive(Debug, thiserror::Error)]
pub enum CarillonError {
    #[error("Melody asset not found: {}", .0.display())]
    AssetNotFound(PathBuf),

    #[error("Melody asset {} is corrupt: {reason}", path.display())]
    AssetCorrupt { path: PathBuf, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("MIDI device error: {0}")]
    DeviceIo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<midir::InitError> for CarillonError {
    fn from(e: midir::InitError) -> Self {
        CarillonError::DeviceIo(e.to_string())
    }
}

impl From<midir::SendError> for CarillonError {
    fn from(e: midir::SendError) -> Self {
        CarillonError::DeviceIo(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for CarillonError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        CarillonError::DeviceIo(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CarillonError>;
