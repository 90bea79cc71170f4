//! Core kernel for the segue session engine.
//!
//! # Primary API
//!
//! - [`Prompt`] / [`active_prompts`]: weighted prompt snapshots and the
//!   active-set rules
//! - [`EngineEvent`] / [`EventBus`]: notifications raised toward the UI
//! - [`AudioOutput`] / [`CpalOutput`] / [`VirtualOutput`]: output graph
//! - [`decode_chunk`] / [`decode_bytes`]: streaming-chunk and file decode
//! - [`Coalescer`]: coalescing rate limiter for prompt pushes
//!
//! # Feature flags
//!
//! - `cpal-output` (default): device-backed output via CPAL

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::EngineConfig;

mod prompt;
pub use prompt::{
    active_prompts, Prompt, PromptMap, WeightedPrompt, DEFAULT_PROMPT_ID, DEFAULT_PROMPT_TEXT,
};

mod event;
pub use event::{EngineEvent, EventBus, PlaybackState};

mod decode;
pub use decode::{decode_bytes, decode_chunk, PcmBuffer, CHUNK_CHANNELS, CHUNK_SAMPLE_RATE};

mod gain;
pub use gain::GainRamp;

mod output;
#[cfg(feature = "cpal-output")]
pub use output::CpalOutput;
pub use output::{AudioOutput, GainOp, VirtualOutput};

mod throttle;
pub use throttle::Coalescer;
