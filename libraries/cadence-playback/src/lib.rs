//! Cadence - Background Playback Coordination
//!
//! Keeps a playlist playing while the UI that started it is gone.
//!
//! This crate provides:
//! - Playlist ownership (tracks, playlist id, current index)
//! - Playback state machine (Idle, Preparing, Playing, Paused)
//! - Automatic advance on completion with bounded retry over unplayable tracks
//! - Shuffle and repeat modes (Off, All, One)
//! - Periodic state snapshots plus pushes after every state change
//! - Forwarding of engine callbacks to subscribers
//!
//! # Architecture
//!
//! `cadence-playback` never decodes audio itself. Opening, decoding and output
//! are done by an [`AudioEngine`] implementation supplied by the platform, which
//! reports asynchronous progress as [`EngineEvent`]s. Subscribers (UI, media
//! notification) receive [`PlayerEvent`]s over crossbeam channels.
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use cadence_playback::{
//!     engine_channel, AudioEngine, EngineError, PlaybackConfig, PlaybackService,
//!     TrackDescriptor,
//! };
//!
//! struct MyEngine;
//!
//! impl AudioEngine for MyEngine {
//!     fn open(&mut self, _uri: &str) -> Result<(), EngineError> { Ok(()) }
//!     fn start(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn pause(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn stop(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn seek_to(&mut self, _position_ms: u64) -> Result<(), EngineError> { Ok(()) }
//!     fn is_playing(&self) -> Result<bool, EngineError> { Ok(false) }
//!     fn current_position(&self) -> Result<i64, EngineError> { Ok(0) }
//!     fn duration(&self) -> Result<i64, EngineError> { Ok(0) }
//! }
//!
//! // The engine keeps `_events_tx` to report prepared/completion/error callbacks
//! let (_events_tx, events_rx) = engine_channel();
//! let mut service =
//!     PlaybackService::start(Box::new(MyEngine), events_rx, &PlaybackConfig::default())?;
//!
//! let updates = service.subscribe();
//! service.coordinator().play(
//!     vec![TrackDescriptor::new("My Song", "/music/song.mp3")],
//!     7,
//!     0,
//! )?;
//!
//! for event in updates.try_iter() {
//!     println!("{:?}", event);
//! }
//!
//! service.shutdown();
//! # Ok::<(), cadence_playback::PlaybackError>(())
//! ```

mod advance;
mod broadcaster;
mod command;
mod coordinator;
pub mod engine;
mod error;
mod events;
mod playlist;
mod service;
pub mod types;

// Public exports
pub use advance::{advance, AdvancePlan};
pub use broadcaster::StateBroadcaster;
pub use command::PlayerCommand;
pub use coordinator::{PlaybackCoordinator, PlaylistUpdate};
pub use engine::{engine_channel, AudioEngine, EngineEvent, EngineEventReceiver, EngineEventSender};
pub use error::{EngineError, PlaybackError, Result};
pub use events::PlayerEvent;
pub use playlist::Playlist;
pub use service::PlaybackService;
pub use types::{
    Direction, PlaybackConfig, PlaybackPhase, RepeatMode, StateSnapshot, TrackDescriptor, NONE,
};
