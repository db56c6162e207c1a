//! Error types for playback coordination

use thiserror::Error;

/// Errors raised by an [`AudioEngine`](crate::AudioEngine) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The data source could not be opened (missing file, unreadable stream, ...)
    #[error("I/O error: {0}")]
    Io(String),

    /// A transport call was made while the engine was in the wrong state
    #[error("Illegal engine state: {0}")]
    IllegalState(String),

    /// The engine has been stopped or released and cannot answer queries
    #[error("Engine unavailable")]
    Unavailable,
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Bad command argument (empty playlist, malformed track, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Index outside of the playlist
    #[error("Index {index} out of range for playlist of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Every track in the playlist failed to open
    #[error("No playable track found after {attempts} attempts")]
    AllTracksUnplayable { attempts: usize },

    /// A single track failed to open; recovered by the advance algorithm
    #[error("Failed to open {uri}: {source}")]
    EngineOpenFailure {
        uri: String,
        #[source]
        source: EngineError,
    },

    /// Malformed command payload
    #[error("Malformed command: {0}")]
    Command(#[from] serde_json::Error),

    /// A worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
