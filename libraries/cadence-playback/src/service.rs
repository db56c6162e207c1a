//! Playback service
//!
//! Wires one coordinator to its engine: an event pump thread feeds engine
//! callbacks into the coordinator and a [`StateBroadcaster`] publishes
//! snapshots on a fixed schedule.

use crate::broadcaster::StateBroadcaster;
use crate::coordinator::PlaybackCoordinator;
use crate::engine::{AudioEngine, EngineEventReceiver};
use crate::error::Result;
use crate::events::PlayerEvent;
use crate::types::PlaybackConfig;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Running playback service
///
/// Owns the coordinator together with the threads that drive it. Dropping the
/// service shuts it down.
pub struct PlaybackService {
    coordinator: Arc<PlaybackCoordinator>,
    broadcaster: StateBroadcaster,
    pump_stop_tx: Sender<()>,
    pump: Option<JoinHandle<()>>,
}

impl PlaybackService {
    /// Start the service
    ///
    /// # Arguments
    /// * `engine` - Engine the coordinator drives
    /// * `engine_events` - Receiving half of the channel `engine` reports callbacks on
    /// * `config` - Playback configuration
    pub fn start(
        engine: Box<dyn AudioEngine>,
        engine_events: EngineEventReceiver,
        config: &PlaybackConfig,
    ) -> Result<Self> {
        let coordinator = Arc::new(PlaybackCoordinator::new(engine, config));
        let (pump_stop_tx, pump_stop_rx) = bounded::<()>(1);

        let pump_coordinator = Arc::clone(&coordinator);
        let pump = thread::Builder::new()
            .name("cadence-engine-events".to_string())
            .spawn(move || Self::pump_run(pump_coordinator, engine_events, pump_stop_rx))?;

        let broadcaster =
            StateBroadcaster::spawn(Arc::clone(&coordinator), config.broadcast_interval())?;

        info!(
            interval_ms = config.broadcast_interval_ms,
            repeat = ?config.repeat,
            shuffle = config.shuffle,
            "playback service started"
        );

        Ok(Self {
            coordinator,
            broadcaster,
            pump_stop_tx,
            pump: Some(pump),
        })
    }

    /// Engine event pump
    ///
    /// Runs until the engine drops its sender or the service shuts down.
    fn pump_run(
        coordinator: Arc<PlaybackCoordinator>,
        engine_events: EngineEventReceiver,
        stop_rx: Receiver<()>,
    ) {
        loop {
            select! {
                recv(engine_events) -> event => match event {
                    Ok(event) => coordinator.handle_engine_event(event),
                    Err(_) => {
                        debug!("engine event channel closed");
                        break;
                    }
                },
                recv(stop_rx) -> _ => break,
            }
        }
    }

    pub fn coordinator(&self) -> &Arc<PlaybackCoordinator> {
        &self.coordinator
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.coordinator.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.pump.is_some()
    }

    /// Tear the service down
    ///
    /// Stops playback (publishing the final idle snapshot), stops the
    /// broadcaster and the event pump, then releases the engine. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(pump) = self.pump.take() else {
            return;
        };

        self.coordinator.stop();
        self.broadcaster.shutdown();

        let _ = self.pump_stop_tx.send(());
        if pump.join().is_err() {
            error!("engine event pump panicked");
        }

        self.coordinator.release_engine();
        info!("playback service stopped");
    }
}

impl Drop for PlaybackService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
