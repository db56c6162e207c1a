//! Core types for playback coordination

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playlist identifier / index value meaning "none"
pub const NONE: i64 = -1;

/// Track information submitted with a playlist
///
/// Created by the caller when a playlist is submitted and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    /// Track title (required, non-empty)
    pub title: String,

    /// Artist name
    #[serde(default)]
    pub artist: Option<String>,

    /// Source URI handed to the audio engine
    pub uri: String,

    /// Thumbnail reference for now-playing UI
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

impl TrackDescriptor {
    /// Create a descriptor with the two required fields
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            uri: uri.into(),
            thumbnail_path: None,
        }
    }

    /// Check the required fields
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PlaybackError::InvalidArgument(
                "track title must not be empty".to_string(),
            ));
        }
        if self.uri.trim().is_empty() {
            return Err(PlaybackError::InvalidArgument(format!(
                "track '{}' has an empty uri",
                self.title
            )));
        }
        Ok(())
    }
}

/// Repeat mode
///
/// `Off` and `All` both wrap around at the end of the playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// No repeat (playlists still loop)
    #[default]
    Off,

    /// Loop entire playlist
    All,

    /// Loop current track only
    One,
}

/// Coordinator state machine phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No playlist, nothing playing
    #[default]
    Idle,

    /// A track has been handed to the engine and is being opened
    Preparing,

    /// Engine is producing sound
    Playing,

    /// Paused by the user, resumable
    Paused,
}

/// Direction used by the advance algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Point-in-time copy of the playback state for subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Current index, or -1
    pub index: i64,

    /// Caller-supplied playlist identifier, or -1
    pub playlist_id: i64,

    /// Position in the current track (ms)
    pub position_ms: u64,

    /// Duration of the current track (ms)
    pub duration_ms: u64,

    pub is_playing: bool,

    pub repeat: RepeatMode,

    pub shuffle: bool,
}

impl StateSnapshot {
    /// Whether this snapshot describes an active playlist
    pub fn is_active(&self) -> bool {
        self.playlist_id != NONE
    }
}

/// Configuration for the playback coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Snapshot broadcast period in milliseconds (default: 300)
    pub broadcast_interval_ms: u64,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Seed for shuffle draws; drawn from entropy when unset
    pub shuffle_seed: Option<u64>,
}

impl PlaybackConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 300,
            repeat: RepeatMode::Off,
            shuffle: false,
            shuffle_seed: None,
        }
    }
}
