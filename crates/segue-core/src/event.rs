//! Playback state and the engine event bus.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Playback state machine, owned by the session controller.
///
/// Exposed read-only to consumers; transitions happen only through the
/// controller and scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Loading,
    Playing,
    Paused,
}

/// Notifications raised by the core, consumed by the UI collaborator.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Playback state transition.
    PlaybackState(PlaybackState),
    /// The remote session rejected a prompt text for this session.
    FilteredPrompt(String),
    /// A user-visible failure, as a human-readable message.
    Error(String),
    /// Current output level in `[0, 1]`.
    AudioLevel(f32),
    /// Time-domain snapshot of the live output, 8-bit unsigned, center 128.
    /// Consumers must copy if they retain it past the event.
    Waveform(Arc<Vec<u8>>),
    /// Beat clock tick, phase 1..=4.
    Beat(u8),
}

/// Multi-subscriber event broadcast.
///
/// Events are delivered to every live subscriber in emit order; subscribers
/// whose receiver has been dropped are pruned on the next emit.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<EngineEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Broadcast an event to all live subscribers.
    pub fn emit(&self, event: EngineEvent) {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
