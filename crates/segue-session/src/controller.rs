//! Session controller: owns the playback state machine and the worker
//! thread that drives it.
//!
//! All mutable session state lives on the worker thread. Public methods
//! enqueue commands; inbound remote messages arrive on a channel created
//! at connect time and are processed strictly in arrival order, in the
//! same loop. Prompt pushes are coalesced to at most one per throttle
//! window, and the loading-to-playing transition fires on a one-shot
//! deadline armed when the first chunk primes the scheduler.

use crate::{ChunkOutcome, ChunkScheduler, ServerMessage, SessionBackend, SessionEvent};
use arc_swap::ArcSwap;
use crossbeam_channel::{never, unbounded, Receiver, Sender};
use segue_core::{
    active_prompts, decode_chunk, AudioOutput, Coalescer, EngineConfig, EngineEvent, Error,
    EventBus, PlaybackState, PromptMap, Result, WeightedPrompt,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// User-facing message for any transport-level failure.
const CONNECTION_ERROR_MSG: &str = "Connection error, please restart audio.";

/// Poll interval when no deadline is pending.
const IDLE_TIMEOUT: Duration = Duration::from_millis(250);

enum Command {
    SetPrompts(PromptMap),
    PlayPause,
    Stop,
    Shutdown,
}

/// Streaming-session front end.
///
/// Owns a worker thread for the lifetime of the controller; dropping it
/// shuts the worker down and joins it.
pub struct SessionController {
    cmd_tx: Sender<Command>,
    playback: Arc<ArcSwap<PlaybackState>>,
    thread: Option<JoinHandle<()>>,
}

impl SessionController {
    pub fn new(
        config: EngineConfig,
        backend: Arc<dyn SessionBackend>,
        output: Arc<dyn AudioOutput>,
        events: EventBus,
    ) -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let playback = Arc::new(ArcSwap::from_pointee(PlaybackState::Stopped));

        let worker_playback = Arc::clone(&playback);
        let thread = std::thread::Builder::new()
            .name("segue-session".into())
            .spawn(move || {
                let mut worker = Worker {
                    scheduler: ChunkScheduler::new(
                        Arc::clone(&output),
                        config.buffer_time_secs,
                    ),
                    throttle: Coalescer::new(config.prompt_throttle),
                    config,
                    backend,
                    output,
                    events,
                    playback: worker_playback,
                    prompts: PromptMap::new(),
                    filtered: HashSet::new(),
                    session: None,
                    inbound_rx: None,
                    prime_deadline: None,
                };
                worker.run(cmd_rx);
            })
            .expect("failed to spawn session worker thread");

        Self {
            cmd_tx,
            playback,
            thread: Some(thread),
        }
    }

    /// Current playback state. Lock-free snapshot read.
    pub fn playback_state(&self) -> PlaybackState {
        **self.playback.load()
    }

    /// Replace the prompt snapshot. Recorded even without a session;
    /// pushes to an open session are throttled with latest-wins
    /// coalescing.
    pub fn set_prompts(&self, prompts: PromptMap) -> Result<()> {
        self.send(Command::SetPrompts(prompts))
    }

    /// Toggle playback: play from stopped/paused, pause from playing,
    /// stop from loading.
    pub fn play_pause(&self) -> Result<()> {
        self.send(Command::PlayPause)
    }

    /// Full stop: ends the session and forces a fresh connect on the
    /// next play.
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Send("session worker is gone".into()))
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct Worker {
    config: EngineConfig,
    backend: Arc<dyn SessionBackend>,
    output: Arc<dyn AudioOutput>,
    events: EventBus,
    playback: Arc<ArcSwap<PlaybackState>>,
    scheduler: ChunkScheduler,
    throttle: Coalescer<Vec<WeightedPrompt>>,
    prompts: PromptMap,
    filtered: HashSet<String>,
    session: Option<Box<dyn crate::SessionHandle>>,
    inbound_rx: Option<Receiver<SessionEvent>>,
    prime_deadline: Option<Instant>,
}

impl Worker {
    fn run(&mut self, cmd_rx: Receiver<Command>) {
        let disconnected = never::<SessionEvent>();
        loop {
            let timeout = self.next_timeout();
            // Cloned out so the arm bodies can borrow self mutably.
            let inbound = self
                .inbound_rx
                .clone()
                .unwrap_or_else(|| disconnected.clone());

            crossbeam_channel::select! {
                recv(cmd_rx) -> cmd => match cmd {
                    Ok(Command::SetPrompts(prompts)) => self.handle_set_prompts(prompts),
                    Ok(Command::PlayPause) => self.handle_play_pause(),
                    Ok(Command::Stop) => self.stop_session(),
                    Ok(Command::Shutdown) | Err(_) => break,
                },
                recv(inbound) -> event => match event {
                    Ok(event) => self.handle_session_event(event),
                    // Backend dropped the sender without a Closed message.
                    Err(_) => self.handle_transport_failure("inbound channel closed"),
                },
                default(timeout) => {}
            }

            self.flush_deadlines();
        }
    }

    /// Time until the nearest pending deadline.
    fn next_timeout(&self) -> Duration {
        let now = Instant::now();
        [self.throttle.next_deadline(), self.prime_deadline]
            .into_iter()
            .flatten()
            .map(|d| d.saturating_duration_since(now))
            .min()
            .unwrap_or(IDLE_TIMEOUT)
    }

    fn flush_deadlines(&mut self) {
        if let Some(deadline) = self.prime_deadline {
            if Instant::now() >= deadline {
                self.prime_deadline = None;
                // Only the loading state graduates to playing; a pause or
                // stop issued during the lookahead wins.
                if self.state() == PlaybackState::Loading {
                    self.set_state(PlaybackState::Playing);
                }
            }
        }

        if let Some(prompts) = self.throttle.take_due() {
            self.push_prompts(&prompts);
        }
    }

    fn state(&self) -> PlaybackState {
        **self.playback.load()
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state() == state {
            return;
        }
        debug!(?state, "playback state");
        self.playback.store(Arc::new(state));
        self.events.emit(EngineEvent::PlaybackState(state));
    }

    fn handle_set_prompts(&mut self, prompts: PromptMap) {
        self.prompts = prompts;
        if self.session.is_some() {
            self.offer_prompts();
        }
    }

    fn offer_prompts(&mut self) {
        let active = active_prompts(&self.prompts, &self.filtered);
        if let Some(active) = self.throttle.offer(active) {
            self.push_prompts(&active);
        }
    }

    fn push_prompts(&mut self, prompts: &[WeightedPrompt]) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.set_weighted_prompts(prompts) {
            // The session stays valid after a failed push; back off to
            // paused rather than tearing the connection down.
            warn!("prompt push failed: {e}");
            self.events.emit(EngineEvent::Error(e.to_string()));
            self.pause_session();
        }
    }

    fn handle_play_pause(&mut self) {
        match self.state() {
            PlaybackState::Stopped | PlaybackState::Paused => self.start_session(),
            PlaybackState::Playing => self.pause_session(),
            PlaybackState::Loading => self.stop_session(),
        }
    }

    fn start_session(&mut self) {
        self.set_state(PlaybackState::Loading);

        if self.session.is_none() {
            let (tx, rx) = unbounded();
            match self.backend.connect(&self.config.model, tx) {
                Ok(handle) => {
                    // Filtering is per-session; a fresh connection starts
                    // with a clean slate.
                    self.filtered.clear();
                    self.session = Some(handle);
                    self.inbound_rx = Some(rx);
                }
                Err(e) => {
                    warn!("connect failed: {e}");
                    self.handle_transport_failure("connect failed");
                    return;
                }
            }
        }

        self.offer_prompts();
        self.output.resume();

        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.play() {
                warn!("session play failed: {e}");
                self.handle_transport_failure("play failed");
                return;
            }
        }

        self.output.ramp_gain(0.0, 1.0, self.config.gain_ramp_secs);
    }

    fn pause_session(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.pause() {
                warn!("session pause failed: {e}");
            }
        }
        self.set_state(PlaybackState::Paused);
        // Fade out and drop scheduled audio so it cannot resurface; the
        // write head resets and the next play re-primes from empty.
        self.output.fade_out_and_clear(self.config.gain_ramp_secs);
        self.scheduler.reset();
        self.prime_deadline = None;
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.stop() {
                warn!("session stop failed: {e}");
            }
        }
        self.set_state(PlaybackState::Stopped);
        self.output.clear_scheduled();
        // Gain returns to idle-ready for the next play; silencing is done
        // by the cleared schedule and the stopped state, not the gain.
        self.output.ramp_gain(0.0, 1.0, self.config.gain_ramp_secs);
        self.scheduler.reset();
        self.prime_deadline = None;
        self.session = None;
        self.inbound_rx = None;
    }

    fn handle_transport_failure(&mut self, reason: &str) {
        warn!("transport failure: {reason}");
        self.stop_session();
        self.events
            .emit(EngineEvent::Error(CONNECTION_ERROR_MSG.into()));
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Message(ServerMessage::SetupComplete) => {
                debug!("session setup complete");
            }
            SessionEvent::Message(ServerMessage::FilteredPrompt(text)) => {
                // Always recorded; only the notification is gated.
                self.filtered.insert(text.clone());
                if !text.is_empty() {
                    self.events.emit(EngineEvent::FilteredPrompt(text));
                }
            }
            SessionEvent::Message(ServerMessage::AudioChunks(chunks)) => {
                self.handle_audio_chunks(chunks);
            }
            SessionEvent::TransportError(reason) => {
                self.handle_transport_failure(&reason);
            }
            SessionEvent::Closed => {
                self.handle_transport_failure("connection closed");
            }
        }
    }

    fn handle_audio_chunks(&mut self, chunks: Vec<String>) {
        for chunk in chunks {
            // Chunks racing a pause/stop are discarded, not replayed.
            if matches!(
                self.state(),
                PlaybackState::Paused | PlaybackState::Stopped
            ) {
                return;
            }

            let buffer = match decode_chunk(&chunk) {
                Ok(buffer) => buffer,
                Err(e) => {
                    warn!("dropping undecodable chunk: {e}");
                    continue;
                }
            };

            match self.scheduler.schedule(buffer) {
                ChunkOutcome::Primed => {
                    let lookahead = Duration::from_secs_f64(self.scheduler.buffer_time());
                    self.prime_deadline = Some(Instant::now() + lookahead);
                }
                ChunkOutcome::Underrun => {
                    self.set_state(PlaybackState::Loading);
                    self.prime_deadline = None;
                }
                ChunkOutcome::Scheduled => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionHandle;
    use base64::Engine as _;
    use parking_lot::Mutex;
    use segue_core::{Prompt, VirtualOutput};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MockShared {
        sent: Mutex<Vec<Vec<WeightedPrompt>>>,
        calls: Mutex<Vec<&'static str>>,
        inbound: Mutex<Option<Sender<SessionEvent>>>,
        fail_sends: AtomicBool,
        fail_connect: AtomicBool,
        connects: Mutex<usize>,
    }

    struct MockHandle(Arc<MockShared>);

    impl SessionHandle for MockHandle {
        fn set_weighted_prompts(&mut self, prompts: &[WeightedPrompt]) -> Result<()> {
            if self.0.fail_sends.load(Ordering::Relaxed) {
                return Err(Error::Send("prompt rejected".into()));
            }
            self.0.sent.lock().push(prompts.to_vec());
            Ok(())
        }
        fn play(&mut self) -> Result<()> {
            self.0.calls.lock().push("play");
            Ok(())
        }
        fn pause(&mut self) -> Result<()> {
            self.0.calls.lock().push("pause");
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            self.0.calls.lock().push("stop");
            Ok(())
        }
    }

    struct MockBackend(Arc<MockShared>);

    impl SessionBackend for MockBackend {
        fn connect(
            &self,
            _model: &str,
            inbound: Sender<SessionEvent>,
        ) -> Result<Box<dyn SessionHandle>> {
            if self.0.fail_connect.load(Ordering::Relaxed) {
                return Err(Error::Transport("refused".into()));
            }
            *self.0.connects.lock() += 1;
            *self.0.inbound.lock() = Some(inbound);
            Ok(Box::new(MockHandle(Arc::clone(&self.0))))
        }
    }

    struct Fixture {
        controller: SessionController,
        shared: Arc<MockShared>,
        output: Arc<VirtualOutput>,
        events: Receiver<EngineEvent>,
    }

    fn fixture() -> Fixture {
        let config = EngineConfig {
            buffer_time_secs: 0.05,
            prompt_throttle: Duration::from_millis(30),
            gain_ramp_secs: 0.01,
            ..EngineConfig::default()
        };
        let shared = Arc::new(MockShared::default());
        let output = Arc::new(VirtualOutput::new());
        let bus = EventBus::new();
        let events = bus.subscribe();
        let controller = SessionController::new(
            config,
            Arc::new(MockBackend(Arc::clone(&shared))),
            Arc::clone(&output) as Arc<dyn AudioOutput>,
            bus,
        );
        Fixture {
            controller,
            shared,
            output,
            events,
        }
    }

    fn settle() {
        std::thread::sleep(Duration::from_millis(20));
    }

    fn inject(shared: &MockShared, event: SessionEvent) {
        shared
            .inbound
            .lock()
            .as_ref()
            .expect("no session connected")
            .send(event)
            .unwrap();
    }

    /// One second's worth of silent 16-bit stereo PCM, base64.
    fn chunk_payload(secs: f64) -> String {
        let bytes = vec![0u8; (secs * 48_000.0) as usize * 2 * 2];
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn states(events: &Receiver<EngineEvent>) -> Vec<PlaybackState> {
        events
            .try_iter()
            .filter_map(|e| match e {
                EngineEvent::PlaybackState(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn play_connects_and_sends_default_prompt() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Loading);
        assert!(fx.output.resumed());
        assert_eq!(*fx.shared.connects.lock(), 1);
        assert_eq!(*fx.shared.calls.lock(), vec!["play"]);

        let sent = fx.shared.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 1);
        assert_eq!(sent[0][0].text, segue_core::DEFAULT_PROMPT_TEXT);
    }

    #[test]
    fn chunks_prime_then_butt_end_to_end_and_loading_becomes_playing() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        let payload = chunk_payload(0.1);
        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![
                payload.clone(),
                payload.clone(),
                payload,
            ])),
        );
        std::thread::sleep(Duration::from_millis(100));

        // buffer_time 0.05, chunk length 0.1.
        assert_eq!(fx.output.scheduled_starts(), vec![0.05, 0.15, 0.25]);
        assert_eq!(fx.controller.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn underrun_discards_chunk_and_reenters_loading() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![chunk_payload(0.1)])),
        );
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(fx.controller.playback_state(), PlaybackState::Playing);

        // Clock passes the write head before the next chunk arrives.
        fx.output.advance(1.0);
        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![chunk_payload(0.1)])),
        );
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Loading);
        assert_eq!(fx.output.scheduled_starts().len(), 1);
    }

    #[test]
    fn rapid_prompt_updates_coalesce_to_latest() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();
        // Let the window opened by the connect-time push elapse.
        std::thread::sleep(Duration::from_millis(40));
        let baseline = fx.shared.sent.lock().len();

        for weight in 1..=5 {
            let mut map = PromptMap::new();
            map.insert(
                "p1".into(),
                Prompt {
                    prompt_id: "p1".into(),
                    text: format!("techno {weight}"),
                    weight: weight as f64,
                    cc: 0,
                    color: "#fff".into(),
                },
            );
            fx.controller.set_prompts(map).unwrap();
        }
        std::thread::sleep(Duration::from_millis(80));

        let sent = fx.shared.sent.lock();
        let pushes = &sent[baseline..];
        // Leading edge plus one trailing flush with the final snapshot.
        assert_eq!(pushes.len(), 2, "pushes: {pushes:?}");
        assert_eq!(pushes[1][0].text, "techno 5");
        assert_eq!(pushes[1][0].weight, 5.0);
    }

    #[test]
    fn filtered_prompts_are_excluded_from_pushes() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::FilteredPrompt("banned".into())),
        );
        settle();

        let notices: Vec<_> = fx
            .events
            .try_iter()
            .filter(|e| matches!(e, EngineEvent::FilteredPrompt(_)))
            .collect();
        assert_eq!(notices.len(), 1);

        std::thread::sleep(Duration::from_millis(40));
        let mut map = PromptMap::new();
        for (id, text) in [("a", "banned"), ("b", "allowed")] {
            map.insert(
                id.into(),
                Prompt {
                    prompt_id: id.into(),
                    text: text.into(),
                    weight: 1.0,
                    cc: 0,
                    color: "#fff".into(),
                },
            );
        }
        fx.controller.set_prompts(map).unwrap();
        settle();

        let sent = fx.shared.sent.lock();
        let last = sent.last().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].text, "allowed");
    }

    #[test]
    fn empty_filtered_text_is_recorded_but_not_notified() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::FilteredPrompt(String::new())),
        );
        settle();
        assert!(
            !fx.events
                .try_iter()
                .any(|e| matches!(e, EngineEvent::FilteredPrompt(_))),
            "empty filtered text must not surface a notification"
        );

        // The empty text still participates in filtering.
        std::thread::sleep(Duration::from_millis(40));
        let mut map = PromptMap::new();
        for (id, text) in [("a", ""), ("b", "house")] {
            map.insert(
                id.into(),
                Prompt {
                    prompt_id: id.into(),
                    text: text.into(),
                    weight: 1.0,
                    cc: 0,
                    color: "#fff".into(),
                },
            );
        }
        fx.controller.set_prompts(map).unwrap();
        settle();

        let sent = fx.shared.sent.lock();
        let last = sent.last().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].text, "house");
    }

    #[test]
    fn transport_error_forces_stop_with_single_notification() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        inject(
            &fx.shared,
            SessionEvent::TransportError("socket reset".into()),
        );
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Stopped);
        let errors: Vec<_> = fx
            .events
            .try_iter()
            .filter_map(|e| match e {
                EngineEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec![CONNECTION_ERROR_MSG.to_string()]);

        // Next play makes a fresh connection.
        fx.controller.play_pause().unwrap();
        settle();
        assert_eq!(*fx.shared.connects.lock(), 2);
    }

    #[test]
    fn send_failure_forces_pause_and_keeps_session() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        fx.shared.fail_sends.store(true, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(40));
        let mut map = PromptMap::new();
        map.insert(
            "p1".into(),
            Prompt {
                prompt_id: "p1".into(),
                text: "jazz".into(),
                weight: 1.0,
                cc: 0,
                color: "#fff".into(),
            },
        );
        fx.controller.set_prompts(map).unwrap();
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Paused);
        assert!(fx
            .events
            .try_iter()
            .any(|e| matches!(e, EngineEvent::Error(_))));

        // Resume reuses the existing session.
        fx.shared.fail_sends.store(false, Ordering::Relaxed);
        fx.controller.play_pause().unwrap();
        settle();
        assert_eq!(*fx.shared.connects.lock(), 1);
        assert_eq!(fx.controller.playback_state(), PlaybackState::Loading);
    }

    #[test]
    fn pause_fades_out_and_resets_scheduling() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();
        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![chunk_payload(0.1)])),
        );
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(fx.controller.playback_state(), PlaybackState::Playing);

        fx.controller.play_pause().unwrap();
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Paused);
        assert!(fx.shared.calls.lock().contains(&"pause"));
        assert!(fx.output.scheduled_starts().is_empty());
        assert!(fx
            .output
            .gain_ops()
            .iter()
            .any(|op| matches!(op, segue_core::GainOp::FadeOutAndClear { .. })));

        // Chunks arriving while paused are discarded.
        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![chunk_payload(0.1)])),
        );
        settle();
        assert!(fx.output.scheduled_starts().is_empty());
    }

    #[test]
    fn stop_tears_down_and_resets_gain_to_idle() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();
        fx.controller.stop().unwrap();
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Stopped);
        assert!(fx.shared.calls.lock().contains(&"stop"));
        assert!(fx.output.scheduled_starts().is_empty());
        assert_eq!(
            fx.output.gain_ops().last(),
            Some(&segue_core::GainOp::Ramp {
                from: 0.0,
                to: 1.0,
                seconds: 0.01
            })
        );
    }

    #[test]
    fn undecodable_chunks_are_dropped_without_error() {
        let fx = fixture();
        fx.controller.play_pause().unwrap();
        settle();

        inject(
            &fx.shared,
            SessionEvent::Message(ServerMessage::AudioChunks(vec![
                "!!not-base64!!".into(),
                chunk_payload(0.1),
            ])),
        );
        settle();

        // The bad chunk is skipped; the good one still primes.
        assert_eq!(fx.output.scheduled_starts().len(), 1);
        assert!(!fx
            .events
            .try_iter()
            .any(|e| matches!(e, EngineEvent::Error(_))));
    }

    #[test]
    fn connect_failure_lands_in_stopped_with_error() {
        let fx = fixture();
        fx.shared.fail_connect.store(true, Ordering::Relaxed);
        fx.controller.play_pause().unwrap();
        settle();

        assert_eq!(fx.controller.playback_state(), PlaybackState::Stopped);
        let seen = states(&fx.events);
        assert_eq!(seen, vec![PlaybackState::Loading, PlaybackState::Stopped]);
    }
}
