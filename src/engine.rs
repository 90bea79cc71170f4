//! SegueEngine that coordinates the session, analysis, and output subsystems.

use crate::Result;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use segue_analysis::{GuideTrack, LevelMonitor};
use segue_core::{EngineEvent, EventBus, PlaybackState, PromptMap};
use segue_session::SessionController;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Streaming music engine.
///
/// Coordinates three subsystems behind one facade:
/// - the session controller, which owns the connection to the generation
///   service and the playback state machine
/// - the guide track, which plays a user-supplied reference file and
///   emits beat events at its detected tempo
/// - the level monitor, which samples the live output for visualization
///   and runs only while the session is audible
///
/// The session and the guide track render to separate outputs; the guide
/// is independent of playback state entirely.
///
/// # Example
///
/// ```ignore
/// use segue::prelude::*;
///
/// let engine = SegueEngine::builder()
///     .backend(my_backend)
///     .build()?;
///
/// let events = engine.subscribe();
/// engine.set_prompts(my_prompts)?;
/// engine.play_pause()?;
///
/// for event in events.iter() {
///     match event {
///         EngineEvent::PlaybackState(state) => println!("{state:?}"),
///         EngineEvent::Beat(phase) => println!("beat {phase}"),
///         _ => {}
///     }
/// }
/// ```
pub struct SegueEngine {
    pub(crate) events: EventBus,
    pub(crate) controller: SessionController,
    pub(crate) guide: Mutex<GuideTrack>,
    /// Present only when an output tap exists.
    pub(crate) monitor: Option<Arc<LevelMonitor>>,
    pub(crate) supervisor_running: Arc<AtomicBool>,
    pub(crate) supervisor: Option<JoinHandle<()>>,
}

impl SegueEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::SegueEngineBuilder {
        crate::SegueEngineBuilder::default()
    }

    /// Register an event subscriber. Every subscriber sees every event,
    /// in emit order.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Current playback state of the streamed session.
    pub fn playback_state(&self) -> PlaybackState {
        self.controller.playback_state()
    }

    /// Replace the steering prompt snapshot. Safe to call at any time;
    /// pushes to an open session are throttled with latest-wins
    /// coalescing.
    pub fn set_prompts(&self, prompts: PromptMap) -> Result<()> {
        self.controller.set_prompts(prompts)
    }

    /// Toggle session playback: play from stopped or paused, pause from
    /// playing, stop from loading.
    pub fn play_pause(&self) -> Result<()> {
        self.controller.play_pause()
    }

    /// Stop the session and drop the connection. The next play connects
    /// fresh.
    pub fn stop(&self) -> Result<()> {
        self.controller.stop()
    }

    /// Load a reference audio file and detect its tempo. Replaces any
    /// previously loaded guide track. Returns the detected BPM.
    pub fn load_guide(&self, data: &[u8]) -> Result<u32> {
        self.guide.lock().load_bytes(data)
    }

    /// Detected tempo of the loaded guide track, if any.
    pub fn guide_bpm(&self) -> Option<u32> {
        self.guide.lock().bpm()
    }

    /// Play the loaded guide track from the top, emitting beat events at
    /// its detected tempo. No-op when nothing is loaded.
    pub fn play_guide(&self) {
        self.guide.lock().play()
    }

    /// Stop guide playback and its beat clock. Idempotent.
    pub fn stop_guide(&self) {
        self.guide.lock().stop()
    }

    pub fn is_guide_playing(&self) -> bool {
        self.guide.lock().is_playing()
    }
}

impl Drop for SegueEngine {
    fn drop(&mut self) {
        self.supervisor_running.store(false, Ordering::Release);
        if let Some(supervisor) = self.supervisor.take() {
            let _ = supervisor.join();
        }
        if let Some(monitor) = &self.monitor {
            monitor.stop();
        }
    }
}

/// Drives the level monitor from playback-state events: sampling runs
/// while the session is audible and stops otherwise.
pub(crate) fn spawn_monitor_supervisor(
    events: Receiver<EngineEvent>,
    monitor: Arc<LevelMonitor>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("segue-monitor".into())
        .spawn(move || {
            while running.load(Ordering::Acquire) {
                match events.recv_timeout(Duration::from_millis(100)) {
                    Ok(EngineEvent::PlaybackState(PlaybackState::Playing)) => {
                        debug!("starting level monitor");
                        monitor.start();
                    }
                    Ok(EngineEvent::PlaybackState(_)) => {
                        debug!("stopping level monitor");
                        monitor.stop();
                    }
                    Ok(_) => {}
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .expect("failed to spawn monitor supervisor thread")
}
