//! Remote session abstraction.
//!
//! The controller talks to the music-generation service through these
//! traits; the concrete transport (websocket, gRPC stream, in-process
//! fake) is supplied by the embedder. Inbound traffic arrives on a
//! channel the controller hands to [`SessionBackend::connect`], so the
//! controller's event loop processes messages strictly in arrival order.

use crossbeam_channel::Sender;
use segue_core::{Result, WeightedPrompt};

/// Messages pushed by the remote session.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Handshake finished; the session accepts control calls.
    SetupComplete,
    /// The service rejected a prompt text for the rest of this session.
    FilteredPrompt(String),
    /// Base64-encoded PCM chunks (48 kHz stereo, 16-bit little-endian).
    AudioChunks(Vec<String>),
}

/// Inbound stream events delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Message(ServerMessage),
    /// Transport-level failure. The session is unusable afterwards.
    TransportError(String),
    /// The remote side closed the connection.
    Closed,
}

/// An open session with the generation service.
pub trait SessionHandle: Send {
    /// Replace the steering prompts for subsequent generation.
    fn set_weighted_prompts(&mut self, prompts: &[WeightedPrompt]) -> Result<()>;

    /// Start or resume generation.
    fn play(&mut self) -> Result<()>;

    /// Suspend generation without discarding session state.
    fn pause(&mut self) -> Result<()>;

    /// End generation for good.
    fn stop(&mut self) -> Result<()>;
}

/// Factory for session connections.
pub trait SessionBackend: Send + Sync {
    /// Open a session against `model`. Inbound messages and transport
    /// failures are delivered through `inbound` until the handle is
    /// dropped or the connection closes.
    fn connect(&self, model: &str, inbound: Sender<SessionEvent>) -> Result<Box<dyn SessionHandle>>;
}
