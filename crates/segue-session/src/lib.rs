//! Streaming music session: remote connection, chunk scheduling, and the
//! playback state machine.
//!
//! # Primary API
//!
//! - [`SessionController`]: command front end over a worker thread
//! - [`SessionBackend`] / [`SessionHandle`]: transport seam supplied by
//!   the embedder
//! - [`ChunkScheduler`]: gapless write-head tracking with underrun
//!   recovery

mod remote;
pub use remote::{ServerMessage, SessionBackend, SessionEvent, SessionHandle};

mod scheduler;
pub use scheduler::{ChunkOutcome, ChunkScheduler};

mod controller;
pub use controller::SessionController;
