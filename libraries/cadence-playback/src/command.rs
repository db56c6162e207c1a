//! Typed command surface
//!
//! Commands arrive from the UI layer as JSON objects naming a `method` plus its
//! arguments, e.g. `{"method":"play","tracks":[...],"playlistId":7,"index":0}`.

use crate::coordinator::{PlaybackCoordinator, PlaylistUpdate};
use crate::error::{PlaybackError, Result};
use crate::types::{RepeatMode, TrackDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Commands accepted by [`PlaybackCoordinator::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum PlayerCommand {
    /// Replace the playlist and start at `index`
    Play {
        tracks: Vec<TrackDescriptor>,
        #[serde(rename = "playlistId")]
        playlist_id: i64,
        index: i64,
    },

    Pause,

    Resume,

    /// Seek within the current track
    Seek {
        #[serde(rename = "positionMs", alias = "duration")]
        position_ms: u64,
    },

    Next,

    Previous,

    /// Stop and clear the playlist
    Stop,

    ToggleRepeat,

    ToggleShuffle,

    SetRepeat { mode: RepeatMode },

    /// Partial playlist update; absent fields are left alone
    Update {
        #[serde(default)]
        tracks: Option<Vec<TrackDescriptor>>,
        #[serde(default, rename = "playlistId")]
        playlist_id: Option<i64>,
        #[serde(default)]
        index: Option<i64>,
    },
}

impl PlayerCommand {
    /// Parse a command from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Method name, for logging
    pub fn method(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Seek { .. } => "seek",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Stop => "stop",
            Self::ToggleRepeat => "toggleRepeat",
            Self::ToggleShuffle => "toggleShuffle",
            Self::SetRepeat { .. } => "setRepeat",
            Self::Update { .. } => "update",
        }
    }
}

impl PlaybackCoordinator {
    /// Route a command to the matching operation
    pub fn dispatch(&self, command: PlayerCommand) -> Result<()> {
        debug!(method = command.method(), "command received");

        match command {
            PlayerCommand::Play {
                tracks,
                playlist_id,
                index,
            } => {
                let index = usize::try_from(index).map_err(|_| {
                    PlaybackError::InvalidArgument(format!("start index {} out of range", index))
                })?;
                self.play(tracks, playlist_id, index)?;
            }
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Seek { position_ms } => self.seek(position_ms),
            PlayerCommand::Next => self.next()?,
            PlayerCommand::Previous => self.previous()?,
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::ToggleRepeat => {
                self.toggle_repeat();
            }
            PlayerCommand::ToggleShuffle => {
                self.toggle_shuffle();
            }
            PlayerCommand::SetRepeat { mode } => self.set_repeat(mode),
            PlayerCommand::Update {
                tracks,
                playlist_id,
                index,
            } => self.update(PlaylistUpdate {
                tracks,
                playlist_id,
                index,
            })?,
        }

        Ok(())
    }

    /// Parse and dispatch a JSON command
    pub fn dispatch_json(&self, json: &str) -> Result<()> {
        self.dispatch(PlayerCommand::from_json(json)?)
    }
}
