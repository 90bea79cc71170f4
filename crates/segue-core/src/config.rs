//! Engine configuration.

use crate::{Error, Result};
use std::time::Duration;

/// Configuration for the session engine.
///
/// The defaults mirror the live generation contract: 48 kHz stereo chunks,
/// a 2 second lookahead, one prompt push per 200 ms window, and a 100 ms
/// gain ramp on play/pause edges.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate of inbound audio chunks.
    pub sample_rate: u32,
    /// Channel count of inbound audio chunks.
    pub channels: u16,
    /// Lookahead inserted before first audible output, in seconds.
    /// Absorbs chunk arrival jitter at the cost of fixed latency.
    pub buffer_time_secs: f64,
    /// Minimum interval between outbound prompt pushes.
    pub prompt_throttle: Duration,
    /// Duration of the gain ramp applied on play/pause transitions.
    pub gain_ramp_secs: f32,
    /// Model identifier handed to the session backend on connect.
    pub model: String,
    /// Output device index, or `None` for the system default.
    pub output_device_index: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            buffer_time_secs: 2.0,
            prompt_throttle: Duration::from_millis(200),
            gain_ramp_secs: 0.1,
            model: "realtime-music".to_string(),
            output_device_index: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample_rate must be non-zero".into()));
        }
        if self.channels == 0 || self.channels > 2 {
            return Err(Error::InvalidConfig(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.buffer_time_secs <= 0.0 {
            return Err(Error::InvalidConfig(
                "buffer_time_secs must be positive".into(),
            ));
        }
        if self.gain_ramp_secs < 0.0 {
            return Err(Error::InvalidConfig(
                "gain_ramp_secs must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
