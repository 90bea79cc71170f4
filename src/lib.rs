//! # Segue - Streaming Music Session Engine
//!
//! Client-side engine for steering and playing a real-time music
//! generation service, built from modular subsystems.
//!
//! ## Architecture
//!
//! Segue is an umbrella crate that coordinates:
//! - **segue-core** - prompts, events, chunk decode, output graph, config
//! - **segue-session** - remote session, chunk scheduling, playback state
//! - **segue-analysis** - live level/waveform monitoring, reference-track
//!   tempo detection and beat clock
//!
//! ## Quick Start
//!
//! ```ignore
//! use segue::prelude::*;
//!
//! let engine = SegueEngine::builder()
//!     .backend(my_backend)
//!     .build()?;
//!
//! let events = engine.subscribe();
//! engine.set_prompts(my_prompts)?;
//! engine.play_pause()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cpal-output` (default) - device-backed output via CPAL; disable for
//!   headless embedding with caller-supplied outputs

/// Re-export of segue-core for direct access
pub use segue_core as core;

// Core types
pub use segue_core::{
    active_prompts, decode_bytes, decode_chunk, AudioOutput, Coalescer, EngineConfig, EngineEvent,
    Error, EventBus, GainRamp, PcmBuffer, PlaybackState, Prompt, PromptMap, Result, VirtualOutput,
    WeightedPrompt, DEFAULT_PROMPT_ID, DEFAULT_PROMPT_TEXT,
};

#[cfg(feature = "cpal-output")]
pub use segue_core::CpalOutput;

// Session types
pub use segue_session::{
    ChunkOutcome, ChunkScheduler, ServerMessage, SessionBackend, SessionController, SessionEvent,
    SessionHandle,
};

// Analysis types
pub use segue_analysis::{estimate_bpm, GuideTrack, LevelMonitor, WAVEFORM_SIZE};

mod engine;
pub use engine::SegueEngine;

mod builder;
pub use builder::SegueEngineBuilder;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        EngineConfig, EngineEvent, PlaybackState, Prompt, PromptMap, SegueEngine,
        SegueEngineBuilder, SessionBackend, SessionEvent, SessionHandle, WeightedPrompt,
    };
}
