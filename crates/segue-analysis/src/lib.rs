//! Analysis layer: live output monitoring and reference-track tempo.
//!
//! # Primary API
//!
//! - [`LevelMonitor`]: background waveform/RMS sampling over the output tap
//! - [`GuideTrack`]: reference-track playback with a derived beat clock
//! - [`estimate_bpm`]: onset-interval tempo estimation

mod monitor;
pub use monitor::{byte_waveform, rms_level, LevelMonitor, WAVEFORM_SIZE};

mod bpm;
pub use bpm::{detect_onsets, estimate_bpm, normalize_bpm, FALLBACK_BPM};

mod guide;
pub use guide::GuideTrack;
