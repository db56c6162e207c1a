//! Shared helpers for integration tests

#![allow(dead_code)]

use cadence_playback::{
    AudioEngine, EngineError, PlaybackConfig, PlaybackCoordinator, PlayerEvent, StateSnapshot,
    TrackDescriptor,
};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Engine state shared between the test and the coordinator
#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<String>,
    pub failing: HashSet<String>,
    pub opened: Option<String>,
    pub playing: bool,
    pub position_ms: i64,
    /// Make every query fail, as engines do after release
    pub queries_fail: bool,
}

/// Mock engine recording every call
#[derive(Clone, Default)]
pub struct MockEngine {
    pub state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that refuses to open the given URIs
    pub fn failing(uris: &[&str]) -> Self {
        let engine = Self::default();
        engine
            .state
            .lock()
            .failing
            .extend(uris.iter().map(|uri| uri.to_string()));
        engine
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// URIs passed to `open`, in order
    pub fn opened_uris(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| call.strip_prefix("open ").map(str::to_string))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn set_position(&self, position_ms: i64) {
        self.state.lock().position_ms = position_ms;
    }

    pub fn set_queries_fail(&self, fail: bool) {
        self.state.lock().queries_fail = fail;
    }
}

impl AudioEngine for MockEngine {
    fn open(&mut self, uri: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(format!("open {}", uri));
        if state.failing.contains(uri) {
            return Err(EngineError::Io(format!("{} not found", uri)));
        }
        state.opened = Some(uri.to_string());
        state.position_ms = 0;
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push("start".to_string());
        if state.opened.is_none() {
            return Err(EngineError::IllegalState("start without source".to_string()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push("pause".to_string());
        state.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push("stop".to_string());
        state.playing = false;
        state.opened = None;
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(format!("seek {}", position_ms));
        state.position_ms = position_ms as i64;
        Ok(())
    }

    fn is_playing(&self) -> Result<bool, EngineError> {
        let state = self.state.lock();
        if state.queries_fail {
            return Err(EngineError::Unavailable);
        }
        Ok(state.playing)
    }

    fn current_position(&self) -> Result<i64, EngineError> {
        let state = self.state.lock();
        if state.queries_fail {
            return Err(EngineError::Unavailable);
        }
        Ok(state.position_ms)
    }

    fn duration(&self) -> Result<i64, EngineError> {
        let state = self.state.lock();
        if state.queries_fail {
            return Err(EngineError::Unavailable);
        }
        Ok(if state.opened.is_some() { 200_000 } else { -1 })
    }

    fn release(&mut self) {
        self.state.lock().calls.push("release".to_string());
    }
}

/// Tracks A, B, C, ... with URIs `/music/a.mp3`, `/music/b.mp3`, ...
pub fn tracks(titles: &[&str]) -> Vec<TrackDescriptor> {
    titles
        .iter()
        .map(|title| TrackDescriptor::new(*title, uri(title)))
        .collect()
}

pub fn uri(title: &str) -> String {
    format!("/music/{}.mp3", title.to_lowercase())
}

/// Coordinator over `engine` with a fixed shuffle seed
pub fn coordinator(engine: &MockEngine) -> PlaybackCoordinator {
    coordinator_with(engine, PlaybackConfig::default())
}

pub fn coordinator_with(engine: &MockEngine, mut config: PlaybackConfig) -> PlaybackCoordinator {
    config.shuffle_seed.get_or_insert(0x5eed);
    PlaybackCoordinator::new(Box::new(engine.clone()), &config)
}

/// Drain pending events
pub fn drain(rx: &Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    rx.try_iter().collect()
}

/// Snapshots among `events`
pub fn snapshots(events: &[PlayerEvent]) -> Vec<StateSnapshot> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::StateUpdated { snapshot } => Some(*snapshot),
            _ => None,
        })
        .collect()
}

/// Titles announced through track-changed events (`None` for a cleared track)
pub fn announced_titles(events: &[PlayerEvent]) -> Vec<Option<String>> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::TrackChanged { track } => Some(track.as_ref().map(|t| t.title.clone())),
            _ => None,
        })
        .collect()
}
