//! Builder for configuring and constructing a `SegueEngine`.

use crate::engine::spawn_monitor_supervisor;
use crate::{Error, Result, SegueEngine};
use parking_lot::Mutex;
use ringbuf::HeapCons;
use segue_analysis::{GuideTrack, LevelMonitor};
use segue_core::{AudioOutput, EngineConfig, EventBus};
use segue_session::{SessionBackend, SessionController};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Tap capacity in samples; roughly one second of mono output.
#[cfg(feature = "cpal-output")]
const TAP_CAPACITY: usize = 48_000;

/// A session backend is mandatory. With the `cpal-output` feature (the
/// default) the builder opens two device outputs, one for the streamed
/// session and one for the guide track; otherwise both outputs must be
/// supplied via [`outputs`](SegueEngineBuilder::outputs).
///
/// # Example
///
/// ```ignore
/// use segue::prelude::*;
///
/// let engine = SegueEngine::builder()
///     .backend(my_backend)
///     .buffer_time(2.0)
///     .build()?;
///
/// let events = engine.subscribe();
/// engine.play_pause()?;
/// ```
pub struct SegueEngineBuilder {
    config: EngineConfig,
    backend: Option<Arc<dyn SessionBackend>>,
    session_output: Option<Arc<dyn AudioOutput>>,
    guide_output: Option<Arc<dyn AudioOutput>>,
    monitor_tap: Option<HeapCons<f32>>,
}

impl Default for SegueEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            backend: None,
            session_output: None,
            guide_output: None,
            monitor_tap: None,
        }
    }
}

impl SegueEngineBuilder {
    /// Transport to the generation service. Required.
    pub fn backend(mut self, backend: Arc<dyn SessionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Lookahead before first audible output, in seconds. Default: 2.0
    pub fn buffer_time(mut self, secs: f64) -> Self {
        self.config.buffer_time_secs = secs;
        self
    }

    /// Minimum interval between prompt pushes. Default: 200 ms
    pub fn prompt_throttle(mut self, window: Duration) -> Self {
        self.config.prompt_throttle = window;
        self
    }

    /// Gain ramp on play/pause edges, in seconds. Default: 0.1
    pub fn gain_ramp(mut self, secs: f32) -> Self {
        self.config.gain_ramp_secs = secs;
        self
    }

    /// Model identifier handed to the backend on connect.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Output device index. Default: the system default device.
    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device_index = Some(index);
        self
    }

    /// Supply both outputs instead of opening audio devices. The level
    /// monitor only runs if a tap is also provided via
    /// [`monitor_tap`](SegueEngineBuilder::monitor_tap).
    pub fn outputs(mut self, session: Arc<dyn AudioOutput>, guide: Arc<dyn AudioOutput>) -> Self {
        self.session_output = Some(session);
        self.guide_output = Some(guide);
        self
    }

    /// Consumer half of a ring buffer fed with mono post-gain output.
    /// Only meaningful together with [`outputs`](SegueEngineBuilder::outputs);
    /// device-backed builds create their own tap.
    pub fn monitor_tap(mut self, tap: HeapCons<f32>) -> Self {
        self.monitor_tap = Some(tap);
        self
    }

    pub fn build(self) -> Result<SegueEngine> {
        let backend = self
            .backend
            .ok_or_else(|| Error::InvalidConfig("a session backend is required".into()))?;
        self.config.validate()?;

        let (session_output, guide_output, tap) =
            match (self.session_output, self.guide_output) {
                (Some(session), Some(guide)) => (session, guide, self.monitor_tap),
                #[cfg(feature = "cpal-output")]
                (None, None) => {
                    let session = segue_core::CpalOutput::new(self.config.output_device_index)?;
                    let tap = session.create_tap(TAP_CAPACITY);
                    let guide = segue_core::CpalOutput::new(self.config.output_device_index)?;
                    (
                        Arc::new(session) as Arc<dyn AudioOutput>,
                        Arc::new(guide) as Arc<dyn AudioOutput>,
                        Some(tap),
                    )
                }
                _ => {
                    return Err(Error::InvalidConfig(
                        "session and guide outputs must be provided together".into(),
                    ))
                }
            };

        let events = EventBus::new();
        let monitor = tap.map(|tap| Arc::new(LevelMonitor::new(tap, events.clone())));

        let controller = SessionController::new(
            self.config.clone(),
            backend,
            session_output,
            events.clone(),
        );
        let guide = Mutex::new(GuideTrack::new(guide_output, events.clone()));

        let supervisor_running = Arc::new(AtomicBool::new(true));
        let supervisor = monitor.as_ref().map(|monitor| {
            spawn_monitor_supervisor(
                events.subscribe(),
                Arc::clone(monitor),
                Arc::clone(&supervisor_running),
            )
        });

        Ok(SegueEngine {
            events,
            controller,
            guide,
            monitor,
            supervisor_running,
            supervisor,
        })
    }
}
