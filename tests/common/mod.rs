//! Shared fixtures: an in-process session backend and chunk builders.

use base64::Engine as _;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use segue::{Error, Prompt, PromptMap, Result, WeightedPrompt};
use segue::{ServerMessage, SessionBackend, SessionEvent, SessionHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared state between a [`MockBackend`] and the handles it creates.
#[derive(Default)]
pub struct MockShared {
    pub sent_prompts: Mutex<Vec<Vec<WeightedPrompt>>>,
    pub control_calls: Mutex<Vec<&'static str>>,
    inbound: Mutex<Option<Sender<SessionEvent>>>,
    pub fail_sends: AtomicBool,
    pub connects: Mutex<usize>,
}

impl MockShared {
    /// Push a server message into the open session.
    pub fn push(&self, message: ServerMessage) {
        self.push_event(SessionEvent::Message(message));
    }

    pub fn push_event(&self, event: SessionEvent) {
        self.inbound
            .lock()
            .as_ref()
            .expect("no session connected")
            .send(event)
            .expect("controller hung up");
    }
}

pub struct MockBackend(pub Arc<MockShared>);

impl SessionBackend for MockBackend {
    fn connect(
        &self,
        _model: &str,
        inbound: Sender<SessionEvent>,
    ) -> Result<Box<dyn SessionHandle>> {
        *self.0.connects.lock() += 1;
        *self.0.inbound.lock() = Some(inbound);
        Ok(Box::new(MockHandle(Arc::clone(&self.0))))
    }
}

struct MockHandle(Arc<MockShared>);

impl SessionHandle for MockHandle {
    fn set_weighted_prompts(&mut self, prompts: &[WeightedPrompt]) -> Result<()> {
        if self.0.fail_sends.load(Ordering::Relaxed) {
            return Err(Error::Send("prompt rejected".into()));
        }
        self.0.sent_prompts.lock().push(prompts.to_vec());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.0.control_calls.lock().push("play");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.0.control_calls.lock().push("pause");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.0.control_calls.lock().push("stop");
        Ok(())
    }
}

/// `secs` of silent 16-bit stereo PCM at 48 kHz, base64-encoded the way
/// the service ships chunks.
pub fn chunk_payload(secs: f64) -> String {
    let bytes = vec![0u8; (secs * 48_000.0) as usize * 2 * 2];
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// One prompt snapshot with a single entry.
pub fn prompt_map(id: &str, text: &str, weight: f64) -> PromptMap {
    let mut map = PromptMap::new();
    map.insert(
        id.to_string(),
        Prompt {
            prompt_id: id.to_string(),
            text: text.to_string(),
            weight,
            cc: 0,
            color: "#9900ff".to_string(),
        },
    );
    map
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
