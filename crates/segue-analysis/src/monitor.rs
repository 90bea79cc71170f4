//! Live output level and waveform monitoring.
//!
//! Runs a sampling loop on a background thread, reading from a SPSC ring
//! buffer fed by the audio callback. Each tick publishes a waveform
//! snapshot and an RMS level through the event bus, for UI feedback only.

use crossbeam_channel::tick;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer},
    HeapCons,
};
use segue_core::{EngineEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Samples per waveform snapshot.
pub const WAVEFORM_SIZE: usize = 2048;

/// Gain applied to the raw RMS for better visual feedback.
const LEVEL_GAIN: f32 = 2.5;

/// Sampling period, a display-refresh equivalent (~60 Hz).
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Convert a unit-range sample window to 8-bit unsigned, center 128.
pub fn byte_waveform(window: &[f32]) -> Vec<u8> {
    window
        .iter()
        .map(|s| (s * 128.0 + 128.0).clamp(0.0, 255.0) as u8)
        .collect()
}

/// RMS of an 8-bit unsigned window, scaled and clamped to `[0, 1]`.
///
/// Each sample maps back to a signed unit value `(s / 128) - 1`; the root
/// mean square is scaled by 2.5 for visual feedback and clamped.
pub fn rms_level(data: &[u8]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = data
        .iter()
        .map(|&s| {
            let value = (s as f32 / 128.0) - 1.0;
            value * value
        })
        .sum();
    let rms = (sum_squares / data.len() as f32).sqrt();
    (rms * LEVEL_GAIN).min(1.0)
}

struct MonitorSlots {
    /// Present while idle; moves into the sampling thread on start.
    tap: Option<HeapCons<f32>>,
    /// Present while running; joining returns the tap for reuse.
    thread: Option<JoinHandle<HeapCons<f32>>>,
}

/// Continuous level/waveform monitor over the live output tap.
///
/// `start` and `stop` are idempotent. `stop` joins the sampling thread, so
/// no event is emitted after it returns. A tap with no data is a per-tick
/// no-op, never an error.
pub struct LevelMonitor {
    slots: Mutex<MonitorSlots>,
    running: Arc<AtomicBool>,
    events: EventBus,
}

impl LevelMonitor {
    pub fn new(tap: HeapCons<f32>, events: EventBus) -> Self {
        Self {
            slots: Mutex::new(MonitorSlots {
                tap: Some(tap),
                thread: None,
            }),
            running: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn start(&self) {
        let mut slots = self.slots.lock();
        if slots.thread.is_some() {
            return;
        }
        let Some(tap) = slots.tap.take() else {
            return;
        };

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let events = self.events.clone();
        slots.thread = Some(std::thread::spawn(move || {
            run_monitor_loop(tap, running, events)
        }));
    }

    pub fn stop(&self) {
        let mut slots = self.slots.lock();
        let Some(handle) = slots.thread.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        if let Ok(tap) = handle.join() {
            slots.tap = Some(tap);
        }
    }
}

fn run_monitor_loop(
    mut tap: HeapCons<f32>,
    running: Arc<AtomicBool>,
    events: EventBus,
) -> HeapCons<f32> {
    let ticker = tick(TICK_INTERVAL);

    // Sliding window of the most recent output samples
    let mut window = [0.0f32; WAVEFORM_SIZE];
    let mut window_pos = 0usize;
    let mut drain_buf = [0.0f32; 1024];

    while running.load(Ordering::Acquire) {
        if ticker.recv_timeout(Duration::from_millis(50)).is_err() {
            continue;
        }

        while tap.occupied_len() > 0 {
            let read = tap.pop_slice(&mut drain_buf);
            for &sample in &drain_buf[..read] {
                window[window_pos % WAVEFORM_SIZE] = sample;
                window_pos += 1;
            }
        }

        // Reconstruct the window in time order from the circular buffer
        let start = window_pos % WAVEFORM_SIZE;
        let mut ordered = Vec::with_capacity(WAVEFORM_SIZE);
        ordered.extend_from_slice(&window[start..]);
        ordered.extend_from_slice(&window[..start]);

        let bytes = byte_waveform(&ordered);
        let level = rms_level(&bytes);

        events.emit(EngineEvent::Waveform(Arc::new(bytes)));
        events.emit(EngineEvent::AudioLevel(level));
    }

    tap
}
