//! Player events
//!
//! Event-based communication with subscribers (UI, notification/session sync).
//! Events are emitted at key points:
//! - State snapshots (periodic, plus pushes after state-changing commands)
//! - Current track changes (as soon as a new track is handed to the engine)
//! - Forwarded engine callbacks (prepared, completion, error, info, seek complete)

use crate::types::{StateSnapshot, TrackDescriptor};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Events delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Point-in-time playback state
    StateUpdated { snapshot: StateSnapshot },

    /// Now-playing track changed (`None` after stop)
    TrackChanged { track: Option<TrackDescriptor> },

    /// Engine finished opening the current track
    Prepared,

    /// Current track played to its end
    Completed,

    /// Engine reported an error
    EngineError { what: i32, extra: i32 },

    /// Engine reported an informational notice
    EngineInfo { what: i32, extra: i32 },

    /// A seek finished
    SeekCompleted,
}

/// Snapshot tagged with the order it was captured in under the state lock
#[derive(Debug, Clone, Copy)]
pub(crate) struct StampedSnapshot {
    pub sequence: u64,
    pub snapshot: StateSnapshot,
}

/// Why a snapshot is being published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Publication {
    /// Pushed after a state-changing command or callback; always delivered
    Forced,

    /// Broadcaster tick; skipped while idle unless the idle state is new
    Periodic,
}

/// Events a subscriber may fall behind by before new ones are dropped for it
const SUBSCRIBER_CAPACITY: usize = 1024;

/// Fan-out of player events to subscribers
///
/// Guarded by its own lock. The coordinator takes it before releasing the
/// state lock, so events reach subscribers in the order they were produced.
/// Sends never block: a subscriber whose queue is full misses events until it
/// drains.
pub(crate) struct EventHub {
    inner: Mutex<HubInner>,
    capacity: usize,
}

struct HubInner {
    subscribers: Vec<Sender<PlayerEvent>>,
    last_sequence: u64,
    last_active: bool,
}

/// Exclusive access to the hub for one batch of publications
pub(crate) struct Delivery<'a> {
    inner: MutexGuard<'a, HubInner>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIBER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                subscribers: Vec::new(),
                last_sequence: 0,
                last_active: false,
            }),
            capacity,
        }
    }

    /// Register a new subscriber
    ///
    /// The receiver sees every event published after this call. Dropping it
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.inner.lock().subscribers.push(tx);
        rx
    }

    /// Lock the hub for a batch of publications
    pub fn begin(&self) -> Delivery<'_> {
        Delivery {
            inner: self.inner.lock(),
        }
    }
}

impl Delivery<'_> {
    /// Deliver an event to every live subscriber
    pub fn publish(&mut self, event: PlayerEvent) {
        deliver(&mut self.inner.subscribers, &event);
    }

    /// Deliver a snapshot, applying ordering and idle suppression
    ///
    /// Returns whether the snapshot was delivered. A snapshot captured before
    /// one already delivered is dropped. Periodic publications of an inactive
    /// state go out once, right after the state became inactive.
    pub fn publish_snapshot(&mut self, stamped: StampedSnapshot, publication: Publication) -> bool {
        let inner = &mut *self.inner;

        if stamped.sequence <= inner.last_sequence {
            trace!(sequence = stamped.sequence, "dropping stale snapshot");
            return false;
        }

        let active = stamped.snapshot.is_active();
        if publication == Publication::Periodic && !active && !inner.last_active {
            return false;
        }

        inner.last_sequence = stamped.sequence;
        inner.last_active = active;
        deliver(
            &mut inner.subscribers,
            &PlayerEvent::StateUpdated {
                snapshot: stamped.snapshot,
            },
        );
        true
    }
}

fn deliver(subscribers: &mut Vec<Sender<PlayerEvent>>, event: &PlayerEvent) {
    subscribers.retain(|tx| match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!("subscriber queue full, dropping event");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    });
}
