//! Playback coordinator - core orchestration
//!
//! Owns the playlist, the phase state machine and the audio engine. Commands
//! from the UI, engine callbacks and broadcaster ticks all run under a single
//! lock; anything meant for subscribers is collected in an outbox while
//! the lock is held. The hub's lock is taken before the state lock is
//! released, so subscribers see events in the order they were produced while
//! delivery itself runs outside the coordinator's critical section.

use crate::{
    advance::AdvancePlan,
    engine::{AudioEngine, EngineEvent},
    error::{PlaybackError, Result},
    events::{Delivery, EventHub, PlayerEvent, Publication, StampedSnapshot},
    playlist::Playlist,
    types::{
        Direction, PlaybackConfig, PlaybackPhase, RepeatMode, StateSnapshot, TrackDescriptor,
        NONE,
    },
};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, trace, warn};

/// Partial playlist update
///
/// Fields left as `None` keep their current value. An `index` of -1 clears
/// the current index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistUpdate {
    pub tracks: Option<Vec<TrackDescriptor>>,
    pub playlist_id: Option<i64>,
    pub index: Option<i64>,
}

/// Central playback coordination
///
/// One instance per hosting process, shared behind an `Arc` between the
/// command router, the engine event pump and the state broadcaster.
pub struct PlaybackCoordinator {
    state: Mutex<CoordinatorState>,
    hub: EventHub,
}

struct CoordinatorState {
    engine: Box<dyn AudioEngine>,
    playlist: Playlist,
    phase: PlaybackPhase,
    repeat: RepeatMode,
    // mode restored when repeat-one is toggled off
    repeat_before_one: RepeatMode,
    shuffle: bool,
    may_resume: bool,
    position_ms: u64,
    duration_ms: u64,
    current_track: Option<TrackDescriptor>,
    // open attempts still available while a track is preparing
    pending: Option<AdvancePlan>,
    rng: StdRng,
    sequence: u64,
}

/// Notifications gathered under the lock, published after it is released
#[derive(Default)]
struct Outbox {
    events: Vec<PlayerEvent>,
    snapshot: Option<StampedSnapshot>,
}

impl PlaybackCoordinator {
    /// Create a coordinator driving `engine`
    pub fn new(engine: Box<dyn AudioEngine>, config: &PlaybackConfig) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let repeat_before_one = match config.repeat {
            RepeatMode::One => RepeatMode::Off,
            mode => mode,
        };

        Self {
            state: Mutex::new(CoordinatorState {
                engine,
                playlist: Playlist::new(),
                phase: PlaybackPhase::Idle,
                repeat: config.repeat,
                repeat_before_one,
                shuffle: config.shuffle,
                may_resume: false,
                position_ms: 0,
                duration_ms: 0,
                current_track: None,
                pending: None,
                rng,
                sequence: 0,
            }),
            hub: EventHub::new(),
        }
    }

    /// Subscribe to snapshots, track changes and forwarded engine callbacks
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.hub.subscribe()
    }

    // ===== Commands =====

    /// Replace the playlist and start playing `tracks[index]`
    ///
    /// If that track cannot be opened the following ones are tried in order
    /// (or at random with shuffle on); the caller only sees an error when
    /// none of them opens.
    pub fn play(&self, tracks: Vec<TrackDescriptor>, playlist_id: i64, index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::InvalidArgument(
                "cannot play an empty playlist".to_string(),
            ));
        }
        if index >= tracks.len() {
            return Err(PlaybackError::InvalidArgument(format!(
                "start index {} out of range for {} tracks",
                index,
                tracks.len()
            )));
        }
        for track in &tracks {
            track.validate()?;
        }

        self.run(|state, outbox| {
            let len = tracks.len();
            state.playlist.replace(tracks, playlist_id, Some(index))?;
            state.may_resume = false;
            debug!(playlist_id, index, len, "playlist replaced");

            let plan = AdvancePlan::starting_at(index, len, Direction::Forward, state.shuffle);
            state.open_with_plan(plan, outbox)
        })
    }

    /// Pause playback; no-op unless currently playing
    pub fn pause(&self) {
        let _ = self.run(|state, outbox| {
            if state.phase != PlaybackPhase::Playing {
                trace!(phase = ?state.phase, "pause ignored");
                return Ok(());
            }
            if let Err(e) = state.engine.pause() {
                warn!(error = %e, "engine refused to pause");
                return Ok(());
            }

            state.may_resume = true;
            state.set_phase(PlaybackPhase::Paused);
            outbox.snapshot = Some(state.capture());
            Ok(())
        });
    }

    /// Resume after a pause; no-op unless paused by the user
    pub fn resume(&self) {
        let _ = self.run(|state, outbox| {
            if state.phase != PlaybackPhase::Paused || !state.may_resume {
                trace!(phase = ?state.phase, may_resume = state.may_resume, "resume ignored");
                return Ok(());
            }
            if let Err(e) = state.engine.start() {
                warn!(error = %e, "engine refused to resume");
                return Ok(());
            }

            state.may_resume = false;
            state.set_phase(PlaybackPhase::Playing);
            outbox.snapshot = Some(state.capture());
            Ok(())
        });
    }

    /// Seek within the current track
    ///
    /// Passed to the engine whatever the phase; a snapshot is pushed when the
    /// engine reports the seek complete.
    pub fn seek(&self, position_ms: u64) {
        let _ = self.run(|state, _| {
            if let Err(e) = state.engine.seek_to(position_ms) {
                warn!(position_ms, phase = ?state.phase, error = %e, "seek failed");
            }
            Ok(())
        });
    }

    /// Skip to the next track (random pick with shuffle on)
    pub fn next(&self) -> Result<()> {
        self.skip(Direction::Forward)
    }

    /// Step back one track
    ///
    /// Always sequential, even with shuffle on.
    pub fn previous(&self) -> Result<()> {
        self.skip(Direction::Backward)
    }

    fn skip(&self, direction: Direction) -> Result<()> {
        self.run(|state, outbox| {
            if state.playlist.is_empty() {
                debug!(?direction, "skip ignored, no playlist");
                return Ok(());
            }

            let plan = AdvancePlan::from_current(
                state.playlist.current_index(),
                state.playlist.len(),
                direction,
                state.shuffle,
                &mut state.rng,
            );
            state.open_with_plan(plan, outbox)
        })
    }

    /// Stop playback and clear the playlist
    ///
    /// Always publishes one final snapshot with playlist id and index at -1.
    pub fn stop(&self) {
        let _ = self.run(|state, outbox| {
            state.halt_engine();
            state.playlist.clear();
            state.may_resume = false;
            state.pending = None;
            state.set_phase(PlaybackPhase::Idle);
            state.announce_track(None, outbox);
            outbox.snapshot = Some(state.capture());
            Ok(())
        });
    }

    /// Toggle repeat-one, returning the new mode
    ///
    /// Switching it off restores the mode that was active before, so two
    /// toggles in a row are always a no-op.
    pub fn toggle_repeat(&self) -> RepeatMode {
        self.with_push(|state| {
            if state.repeat == RepeatMode::One {
                state.repeat = state.repeat_before_one;
            } else {
                state.repeat_before_one = state.repeat;
                state.repeat = RepeatMode::One;
            }
            debug!(repeat = ?state.repeat, "repeat toggled");
            state.repeat
        })
    }

    /// Set the repeat mode explicitly
    pub fn set_repeat(&self, mode: RepeatMode) {
        self.with_push(|state| {
            if mode != RepeatMode::One {
                state.repeat_before_one = mode;
            }
            state.repeat = mode;
        });
    }

    /// Toggle shuffle, returning the new flag
    ///
    /// Only affects how future forward moves pick their track.
    pub fn toggle_shuffle(&self) -> bool {
        self.with_push(|state| {
            state.shuffle = !state.shuffle;
            debug!(shuffle = state.shuffle, "shuffle toggled");
            state.shuffle
        })
    }

    /// Update playlist content, identifier or index without touching the engine
    ///
    /// Meant for reconciling UI state while nothing is playing; keeping the
    /// engine consistent with the playlist is the caller's responsibility.
    pub fn update(&self, update: PlaylistUpdate) -> Result<()> {
        if let Some(tracks) = &update.tracks {
            for track in tracks {
                track.validate()?;
            }
        }

        self.run(|state, _| {
            let len = update
                .tracks
                .as_ref()
                .map_or(state.playlist.len(), Vec::len);

            let index = match update.index {
                None => state.playlist.current_index(),
                Some(NONE) => None,
                Some(index) if index < 0 || index as usize >= len => {
                    return Err(PlaybackError::InvalidArgument(format!(
                        "index {} out of range for {} tracks",
                        index, len
                    )));
                }
                Some(index) => Some(index as usize),
            };
            if let Some(index) = index.filter(|&index| index >= len) {
                return Err(PlaybackError::InvalidArgument(format!(
                    "current index {} out of range for {} tracks",
                    index, len
                )));
            }

            let playlist_id = update.playlist_id.unwrap_or(state.playlist.id());
            match update.tracks {
                Some(tracks) => state.playlist.replace(tracks, playlist_id, index)?,
                None => {
                    state.playlist.set_id(playlist_id);
                    state.playlist.set_current(index)?;
                }
            }
            debug!(
                playlist_id,
                index = state.playlist.index_value(),
                len = state.playlist.len(),
                "playlist updated"
            );
            Ok(())
        })
    }

    // ===== Engine callbacks =====

    /// Single entry point for asynchronous engine callbacks
    ///
    /// Every callback is forwarded to subscribers. Errors never escape: a
    /// failure while preparing moves on to the next track, any other engine
    /// error is logged and leaves the phase unchanged.
    pub fn handle_engine_event(&self, event: EngineEvent) {
        let _ = self.run(|state, outbox| {
            match event {
                EngineEvent::Prepared => {
                    outbox.events.push(PlayerEvent::Prepared);
                    state.on_prepared(outbox);
                }
                EngineEvent::Completion => {
                    outbox.events.push(PlayerEvent::Completed);
                    state.on_completion(outbox);
                }
                EngineEvent::Error { what, extra } => {
                    outbox.events.push(PlayerEvent::EngineError { what, extra });
                    state.on_error(what, extra, outbox);
                }
                EngineEvent::Info { what, extra } => {
                    trace!(what, extra, "engine info");
                    outbox.events.push(PlayerEvent::EngineInfo { what, extra });
                }
                EngineEvent::SeekComplete => {
                    outbox.events.push(PlayerEvent::SeekCompleted);
                    outbox.snapshot = Some(state.capture());
                }
            }
            Ok(())
        });
    }

    // ===== State Queries =====

    /// Current state, refreshed from the engine
    pub fn snapshot(&self) -> StateSnapshot {
        self.state.lock().capture().snapshot
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.lock().phase
    }

    /// Track last announced through [`PlayerEvent::TrackChanged`]
    pub fn current_track(&self) -> Option<TrackDescriptor> {
        self.state.lock().current_track.clone()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat
    }

    pub fn is_shuffled(&self) -> bool {
        self.state.lock().shuffle
    }

    pub fn playlist_len(&self) -> usize {
        self.state.lock().playlist.len()
    }

    // ===== Broadcaster / service hooks =====

    /// Capture a snapshot and publish it as a periodic update
    ///
    /// Returns whether it was delivered.
    pub(crate) fn broadcast_tick(&self) -> bool {
        let mut state = self.state.lock();
        let stamped = state.capture();
        let mut delivery = self.hub.begin();
        drop(state);
        delivery.publish_snapshot(stamped, Publication::Periodic)
    }

    pub(crate) fn release_engine(&self) {
        self.state.lock().engine.release();
    }

    // ===== Internal =====

    fn run<T>(&self, f: impl FnOnce(&mut CoordinatorState, &mut Outbox) -> Result<T>) -> Result<T> {
        let mut outbox = Outbox::default();
        let mut state = self.state.lock();
        let result = f(&mut state, &mut outbox);
        // hub is taken before the state lock is released to keep capture order
        let delivery = self.hub.begin();
        drop(state);
        Self::flush(delivery, outbox);
        result
    }

    fn with_push<T>(&self, f: impl FnOnce(&mut CoordinatorState) -> T) -> T {
        let mut state = self.state.lock();
        let value = f(&mut state);
        let stamped = state.capture();
        let mut delivery = self.hub.begin();
        drop(state);
        delivery.publish_snapshot(stamped, Publication::Forced);
        value
    }

    fn flush(mut delivery: Delivery<'_>, outbox: Outbox) {
        for event in outbox.events {
            delivery.publish(event);
        }
        if let Some(stamped) = outbox.snapshot {
            delivery.publish_snapshot(stamped, Publication::Forced);
        }
    }
}

impl CoordinatorState {
    /// Try candidates from `plan` until one opens
    ///
    /// On success the track is announced and the phase becomes `Preparing`;
    /// the rest of the plan is kept for asynchronous open failures.
    fn open_with_plan(&mut self, mut plan: AdvancePlan, outbox: &mut Outbox) -> Result<()> {
        loop {
            self.halt_engine();

            let Some(index) = plan.next_candidate(&mut self.rng) else {
                let attempts = plan.attempts();
                self.give_up(attempts, outbox);
                return Err(PlaybackError::AllTracksUnplayable { attempts });
            };

            let track = self.playlist.track_at(index)?.clone();
            match self.engine.open(&track.uri) {
                Ok(()) => {
                    self.playlist.set_current(Some(index))?;
                    self.may_resume = false;
                    self.pending = Some(plan);
                    self.set_phase(PlaybackPhase::Preparing);
                    debug!(index, title = %track.title, "opening track");
                    self.announce_track(Some(track), outbox);
                    return Ok(());
                }
                Err(source) => {
                    let failure = PlaybackError::EngineOpenFailure {
                        uri: track.uri,
                        source,
                    };
                    warn!(
                        index,
                        direction = ?plan.direction(),
                        error = %failure,
                        "track failed to open, trying next"
                    );
                }
            }
        }
    }

    fn give_up(&mut self, attempts: usize, outbox: &mut Outbox) {
        error!(
            playlist_id = self.playlist.id(),
            attempts, "no playable track in playlist"
        );
        self.halt_engine();
        self.pending = None;
        self.may_resume = false;
        // None is always within bounds
        let _ = self.playlist.set_current(None);
        self.set_phase(PlaybackPhase::Idle);
        self.announce_track(None, outbox);
        outbox.snapshot = Some(self.capture());
    }

    fn on_prepared(&mut self, outbox: &mut Outbox) {
        if self.phase != PlaybackPhase::Preparing {
            debug!(phase = ?self.phase, "stale prepared callback ignored");
            return;
        }

        match self.engine.start() {
            Ok(()) => {
                self.pending = None;
                self.set_phase(PlaybackPhase::Playing);
                outbox.snapshot = Some(self.capture());
            }
            // plan stays pending so a later error can still advance
            Err(e) => warn!(error = %e, "engine refused to start prepared track"),
        }
    }

    fn on_completion(&mut self, outbox: &mut Outbox) {
        if self.phase != PlaybackPhase::Playing {
            debug!(phase = ?self.phase, "stale completion callback ignored");
            return;
        }

        let len = self.playlist.len();
        let current = self.playlist.current_index();
        let plan = match (self.repeat, current) {
            (RepeatMode::One, Some(index)) => {
                AdvancePlan::starting_at(index, len, Direction::Forward, self.shuffle)
            }
            _ => AdvancePlan::from_current(
                current,
                len,
                Direction::Forward,
                self.shuffle,
                &mut self.rng,
            ),
        };

        if let Err(e) = self.open_with_plan(plan, outbox) {
            error!(error = %e, "auto-advance stopped");
        }
    }

    fn on_error(&mut self, what: i32, extra: i32, outbox: &mut Outbox) {
        if self.phase != PlaybackPhase::Preparing {
            warn!(what, extra, phase = ?self.phase, "engine error, playback left as is");
            return;
        }

        let index = self.playlist.current_index();
        warn!(what, extra, ?index, "track failed while preparing, trying next");
        let Some(plan) = self.pending.take() else {
            return;
        };

        if let Err(e) = self.open_with_plan(plan, outbox) {
            error!(error = %e, "advance after preparation failure stopped");
        }
    }

    fn announce_track(&mut self, track: Option<TrackDescriptor>, outbox: &mut Outbox) {
        self.current_track.clone_from(&track);
        outbox.events.push(PlayerEvent::TrackChanged { track });
    }

    fn set_phase(&mut self, phase: PlaybackPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "phase changed");
            self.phase = phase;
        }
    }

    /// Stop the engine, tolerating engines that reject stop in their current state
    fn halt_engine(&mut self) {
        if let Err(e) = self.engine.stop() {
            trace!(error = %e, "engine stop rejected");
        }
    }

    /// Snapshot with engine queries falling back to zero/false
    fn capture(&mut self) -> StampedSnapshot {
        let has_track = self.phase != PlaybackPhase::Idle;

        self.position_ms = if has_track {
            non_negative(self.engine.current_position().ok())
        } else {
            0
        };
        self.duration_ms = if has_track {
            non_negative(self.engine.duration().ok())
        } else {
            0
        };
        let is_playing = has_track && self.engine.is_playing().unwrap_or(false);

        self.sequence += 1;
        StampedSnapshot {
            sequence: self.sequence,
            snapshot: StateSnapshot {
                index: self.playlist.index_value(),
                playlist_id: self.playlist.id(),
                position_ms: self.position_ms,
                duration_ms: self.duration_ms,
                is_playing,
                repeat: self.repeat,
                shuffle: self.shuffle,
            },
        }
    }
}

fn non_negative(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}
