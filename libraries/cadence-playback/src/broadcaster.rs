//! Periodic state broadcaster
//!
//! A dedicated thread captures a snapshot on every tick and hands it to the
//! coordinator's event hub. Idle ticks are filtered by the hub, so an idle
//! state goes out once and the thread then stays quiet until playback resumes.

use crate::coordinator::PlaybackCoordinator;
use crossbeam_channel::{bounded, select, tick, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Handle to the broadcaster thread
///
/// Dropping the handle stops the thread.
pub struct StateBroadcaster {
    shutdown_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl StateBroadcaster {
    /// Spawn the broadcaster ticking every `period`
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread
    pub fn spawn(coordinator: Arc<PlaybackCoordinator>, period: Duration) -> std::io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("cadence-broadcaster".to_string())
            .spawn(move || {
                let ticker = tick(period);
                debug!(period_ms = period.as_millis() as u64, "state broadcaster started");

                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let delivered = coordinator.broadcast_tick();
                            trace!(delivered, "broadcast tick");
                        }
                        recv(shutdown_rx) -> _ => break,
                    }
                }

                debug!("state broadcaster stopped");
            })?;

        Ok(Self {
            shutdown_tx,
            thread: Some(thread),
        })
    }

    /// Stop the thread and wait for it to exit
    ///
    /// Idempotent.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.shutdown_tx.send(());
        if thread.join().is_err() {
            tracing::error!("state broadcaster thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for StateBroadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}
