/// Host configuration
use crate::error::{HostError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub engine: EngineSettings,
}

/// Simulated engine timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Length of every simulated track
    #[serde(default = "default_track_ms")]
    pub track_ms: u64,

    /// Delay between open and the prepared callback
    #[serde(default = "default_prepare_delay_ms")]
    pub prepare_delay_ms: u64,
}

impl HostConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `cadence.toml` is read if present.
    /// Environment variables override both, e.g.
    /// `CADENCE_PLAYBACK__BROADCAST_INTERVAL_MS=500`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(HostError::Config(format!(
                        "config file {:?} does not exist",
                        path
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with CADENCE_)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.broadcast_interval_ms == 0 {
            return Err(HostError::Config(
                "playback.broadcast_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.engine.track_ms == 0 {
            return Err(HostError::Config(
                "engine.track_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_track_ms() -> u64 {
    30_000
}

fn default_prepare_delay_ms() -> u64 {
    50
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            track_ms: default_track_ms(),
            prepare_delay_ms: default_prepare_delay_ms(),
        }
    }
}
