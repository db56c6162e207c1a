//! Audio engine abstraction
//!
//! The coordinator drives an engine it does not implement: opening a URI,
//! decoding and producing sound all live behind this trait. Engines report
//! asynchronous progress as [`EngineEvent`]s sent on an [`EngineEventSender`].

use crate::error::EngineError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Transport primitives of a platform audio engine
///
/// Calls are made while the coordinator holds its state lock, so they must
/// not block: `open` only validates and schedules preparation, and reports
/// completion later with [`EngineEvent::Prepared`] or [`EngineEvent::Error`].
pub trait AudioEngine: Send {
    /// Begin opening `uri`
    ///
    /// # Returns
    /// * `Ok(())` - Preparation scheduled
    /// * `Err(EngineError::Io(_))` - Source could not be opened at all
    fn open(&mut self, uri: &str) -> Result<(), EngineError>;

    /// Start or resume output of a prepared track
    fn start(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    /// Stop output and drop the current source
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Seek within the current track; completion is reported with [`EngineEvent::SeekComplete`]
    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError>;

    fn is_playing(&self) -> Result<bool, EngineError>;

    /// Current position in milliseconds (may be negative or fail after `stop`)
    fn current_position(&self) -> Result<i64, EngineError>;

    /// Track duration in milliseconds (may be negative or fail after `stop`)
    fn duration(&self) -> Result<i64, EngineError>;

    /// Free platform resources; called once when the owning service shuts down
    fn release(&mut self) {}
}

/// Asynchronous engine callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    /// The opened track is ready to start
    Prepared,

    /// The current track reached its end
    Completion,

    /// Engine error, with platform-specific codes
    Error { what: i32, extra: i32 },

    /// Informational notice, with platform-specific codes
    Info { what: i32, extra: i32 },

    /// A seek finished
    SeekComplete,
}

/// Sending half handed to an engine implementation
pub type EngineEventSender = Sender<EngineEvent>;

/// Receiving half consumed by the playback service
pub type EngineEventReceiver = Receiver<EngineEvent>;

/// Create the channel an engine reports its callbacks on
pub fn engine_channel() -> (EngineEventSender, EngineEventReceiver) {
    unbounded()
}

/// Scripted engine for unit tests
///
/// Records every call and fails to open URIs listed in `failing`.
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    pub(crate) struct Script {
        pub calls: Vec<String>,
        pub playing: bool,
        pub opened: Option<String>,
        pub failing: HashSet<String>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct ScriptedEngine {
        pub script: Arc<Mutex<Script>>,
    }

    impl ScriptedEngine {
        pub fn failing(uris: &[&str]) -> Self {
            let engine = Self::default();
            engine
                .script
                .lock()
                .failing
                .extend(uris.iter().map(|uri| uri.to_string()));
            engine
        }

        pub fn calls(&self) -> Vec<String> {
            self.script.lock().calls.clone()
        }
    }

    impl AudioEngine for ScriptedEngine {
        fn open(&mut self, uri: &str) -> Result<(), EngineError> {
            let mut script = self.script.lock();
            script.calls.push(format!("open {}", uri));
            if script.failing.contains(uri) {
                return Err(EngineError::Io(format!("cannot open {}", uri)));
            }
            script.opened = Some(uri.to_string());
            Ok(())
        }

        fn start(&mut self) -> Result<(), EngineError> {
            let mut script = self.script.lock();
            script.calls.push("start".to_string());
            script.playing = true;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), EngineError> {
            let mut script = self.script.lock();
            script.calls.push("pause".to_string());
            script.playing = false;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), EngineError> {
            let mut script = self.script.lock();
            script.calls.push("stop".to_string());
            script.playing = false;
            script.opened = None;
            Ok(())
        }

        fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
            self.script.lock().calls.push(format!("seek {}", position_ms));
            Ok(())
        }

        fn is_playing(&self) -> Result<bool, EngineError> {
            Ok(self.script.lock().playing)
        }

        fn current_position(&self) -> Result<i64, EngineError> {
            if self.script.lock().opened.is_some() {
                Ok(1_000)
            } else {
                Err(EngineError::Unavailable)
            }
        }

        fn duration(&self) -> Result<i64, EngineError> {
            if self.script.lock().opened.is_some() {
                Ok(180_000)
            } else {
                Ok(-1)
            }
        }

        fn release(&mut self) {
            let mut script = self.script.lock();
            script.calls.push("release".to_string());
            script.opened = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_events_round_trip_through_channel() {
        let (tx, rx) = engine_channel();
        tx.send(EngineEvent::Prepared).unwrap();
        tx.send(EngineEvent::Error { what: 1, extra: -1004 }).unwrap();

        assert_eq!(rx.recv().unwrap(), EngineEvent::Prepared);
        assert_eq!(rx.recv().unwrap(), EngineEvent::Error { what: 1, extra: -1004 });
    }

    #[test]
    fn engine_event_json_shape() {
        let json = serde_json::to_value(EngineEvent::Info { what: 701, extra: 0 }).unwrap();
        assert_eq!(json["event"], "info");
        assert_eq!(json["what"], 701);
    }
}
