//! Cadence host
//!
//! Hosting process for the playback coordinator: loads configuration, runs a
//! [`cadence_playback::PlaybackService`] over the simulated engine and speaks
//! line-oriented JSON on stdin/stdout.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::HostConfig;
pub use engine::SimulatedEngine;
pub use error::{HostError, Result};
