//! Gapless chunk scheduling against the output clock.
//!
//! Chunks are butted end-to-end at absolute output-clock times. The first
//! chunk of a cycle primes a lookahead of `buffer_time` seconds; if the
//! write head ever falls behind the clock the cycle is abandoned and the
//! next chunk re-primes from empty.

use segue_core::{AudioOutput, PcmBuffer};
use std::sync::Arc;

/// Result of offering one chunk to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// First chunk of a cycle; playback becomes audible after the
    /// lookahead elapses.
    Primed,
    /// Scheduled at the current write head.
    Scheduled,
    /// The write head fell behind the clock. The chunk was discarded and
    /// scheduling state reset; the caller should re-enter buffering.
    Underrun,
}

/// Write-head tracker for the streamed session audio.
pub struct ChunkScheduler {
    output: Arc<dyn AudioOutput>,
    buffer_time: f64,
    /// Absolute output-clock time for the next chunk; 0.0 means unprimed.
    next_start_time: f64,
}

impl ChunkScheduler {
    pub fn new(output: Arc<dyn AudioOutput>, buffer_time: f64) -> Self {
        Self {
            output,
            buffer_time,
            next_start_time: 0.0,
        }
    }

    pub fn buffer_time(&self) -> f64 {
        self.buffer_time
    }

    pub fn is_primed(&self) -> bool {
        self.next_start_time != 0.0
    }

    /// Schedule a decoded chunk at the write head.
    pub fn schedule(&mut self, buffer: PcmBuffer) -> ChunkOutcome {
        let now = self.output.now();
        let primed = self.next_start_time == 0.0;
        if primed {
            self.next_start_time = now + self.buffer_time;
        }

        if self.next_start_time < now {
            self.next_start_time = 0.0;
            return ChunkOutcome::Underrun;
        }

        let duration = buffer.duration_secs();
        self.output.schedule(buffer, self.next_start_time);
        self.next_start_time += duration;

        if primed {
            ChunkOutcome::Primed
        } else {
            ChunkOutcome::Scheduled
        }
    }

    /// Forget the write head so the next chunk re-primes from empty.
    /// Never rewinds audio already handed to the output.
    pub fn reset(&mut self) {
        self.next_start_time = 0.0;
    }
}
