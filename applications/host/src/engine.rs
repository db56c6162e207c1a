/// Simulated audio engine
///
/// Stands in for a platform player: no sound is produced, but opening,
/// preparing, playback progress, completion and seeking follow the timing of
/// a real engine and are reported through the engine event channel.
use crate::config::EngineSettings;
use cadence_playback::{AudioEngine, EngineError, EngineEvent, EngineEventSender};
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Worker resolution
const TICK: Duration = Duration::from_millis(10);

/// Engine-side transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Stopped,
    Preparing { since: Instant },
    Prepared,
    Playing { since: Instant },
    Paused,
}

struct SimState {
    transport: Transport,
    /// Position accumulated before the current playing stretch
    base_position_ms: u64,
    track_ms: u64,
    prepare_delay: Duration,
    seek_pending: bool,
    released: bool,
}

impl SimState {
    fn position_ms(&self) -> u64 {
        let running = match self.transport {
            Transport::Playing { since } => since.elapsed().as_millis() as u64,
            _ => 0,
        };
        (self.base_position_ms + running).min(self.track_ms)
    }

    fn has_source(&self) -> bool {
        !matches!(self.transport, Transport::Stopped)
    }
}

pub struct SimulatedEngine {
    state: Arc<Mutex<SimState>>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    /// Create the engine and start its timing worker
    pub fn new(settings: &EngineSettings, events: EngineEventSender) -> std::io::Result<Self> {
        let state = Arc::new(Mutex::new(SimState {
            transport: Transport::Stopped,
            base_position_ms: 0,
            track_ms: settings.track_ms,
            prepare_delay: Duration::from_millis(settings.prepare_delay_ms),
            seek_pending: false,
            released: false,
        }));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("simulated-engine".to_string())
            .spawn(move || {
                let ticker = tick(TICK);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            for event in Self::advance_clock(&worker_state) {
                                if events.send(event).is_err() {
                                    return;
                                }
                            }
                        }
                        recv(shutdown_rx) -> _ => return,
                    }
                }
            })?;

        Ok(Self {
            state,
            shutdown_tx,
            worker: Some(worker),
        })
    }

    /// Move the simulated clock forward, returning the callbacks now due
    fn advance_clock(state: &Mutex<SimState>) -> Vec<EngineEvent> {
        let mut state = state.lock();
        let mut due = Vec::new();

        if state.seek_pending {
            state.seek_pending = false;
            due.push(EngineEvent::SeekComplete);
        }

        let transport = state.transport;
        match transport {
            Transport::Preparing { since } if since.elapsed() >= state.prepare_delay => {
                state.transport = Transport::Prepared;
                due.push(EngineEvent::Prepared);
            }
            Transport::Playing { .. } if state.position_ms() >= state.track_ms => {
                state.base_position_ms = state.track_ms;
                state.transport = Transport::Paused;
                due.push(EngineEvent::Completion);
            }
            _ => {}
        }

        due
    }

    fn check_available(state: &SimState) -> Result<(), EngineError> {
        if state.released {
            return Err(EngineError::Unavailable);
        }
        Ok(())
    }
}

/// Whether `uri` names a local file that is missing
fn is_missing_local_file(uri: &str) -> bool {
    let path = uri.strip_prefix("file://").unwrap_or(uri);
    if path.contains("://") {
        return false;
    }
    !Path::new(path).exists()
}

impl AudioEngine for SimulatedEngine {
    fn open(&mut self, uri: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;

        if is_missing_local_file(uri) {
            return Err(EngineError::Io(format!("no such file: {}", uri)));
        }

        debug!(uri, "simulated open");
        state.transport = Transport::Preparing {
            since: Instant::now(),
        };
        state.base_position_ms = 0;
        state.seek_pending = false;
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;

        let transport = state.transport;
        match transport {
            Transport::Prepared | Transport::Paused => {
                state.transport = Transport::Playing {
                    since: Instant::now(),
                };
                Ok(())
            }
            Transport::Playing { .. } => Ok(()),
            other => Err(EngineError::IllegalState(format!(
                "start called while {:?}",
                other
            ))),
        }
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;

        if matches!(state.transport, Transport::Playing { .. }) {
            state.base_position_ms = state.position_ms();
            state.transport = Transport::Paused;
            return Ok(());
        }
        Err(EngineError::IllegalState(
            "pause called while not playing".to_string(),
        ))
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;

        state.transport = Transport::Stopped;
        state.base_position_ms = 0;
        state.seek_pending = false;
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;

        if !state.has_source() {
            return Err(EngineError::IllegalState(
                "seek called without a source".to_string(),
            ));
        }

        let target = position_ms.min(state.track_ms);
        state.base_position_ms = target;
        if matches!(state.transport, Transport::Playing { .. }) {
            state.transport = Transport::Playing {
                since: Instant::now(),
            };
        }
        state.seek_pending = true;
        trace!(target, "simulated seek");
        Ok(())
    }

    fn is_playing(&self) -> Result<bool, EngineError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(matches!(state.transport, Transport::Playing { .. }))
    }

    fn current_position(&self) -> Result<i64, EngineError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        if !state.has_source() {
            return Err(EngineError::Unavailable);
        }
        Ok(state.position_ms() as i64)
    }

    fn duration(&self) -> Result<i64, EngineError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        match state.transport {
            Transport::Stopped | Transport::Preparing { .. } => Ok(-1),
            _ => Ok(state.track_ms as i64),
        }
    }

    fn release(&mut self) {
        self.state.lock().released = true;
        let _ = self.shutdown_tx.try_send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        debug!("simulated engine released");
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.release();
    }
}
