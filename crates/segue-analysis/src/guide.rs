//! Reference-track playback with a derived beat clock.
//!
//! A guide track is any decodable audio file the user loads as a tempo
//! reference. Loading estimates its BPM; playing schedules the buffer on a
//! dedicated output and drives a 1..=4 beat phase at the detected tempo.

use crate::bpm::estimate_bpm;
use crossbeam_channel::{bounded, tick, Sender};
use segue_core::{decode_bytes, AudioOutput, EngineEvent, EventBus, PcmBuffer, Result};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

/// Beat phase counter thread, stopped by message or track end.
struct BeatClock {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// A loaded reference track and its beat clock.
///
/// Playback is independent of the streaming session; the beat clock runs
/// for the duration of the buffer and ends naturally with it. Loading a
/// new track stops and replaces the previous one.
pub struct GuideTrack {
    output: Arc<dyn AudioOutput>,
    events: EventBus,
    buffer: Option<PcmBuffer>,
    bpm: Option<u32>,
    clock: Option<BeatClock>,
}

impl GuideTrack {
    pub fn new(output: Arc<dyn AudioOutput>, events: EventBus) -> Self {
        Self {
            output,
            events,
            buffer: None,
            bpm: None,
            clock: None,
        }
    }

    /// Decode an audio file from memory and estimate its tempo.
    ///
    /// Stops any current playback and replaces the loaded track. Returns
    /// the detected BPM.
    pub fn load_bytes(&mut self, data: &[u8]) -> Result<u32> {
        self.stop();
        self.buffer = None;
        self.bpm = None;

        let buffer = decode_bytes(data)?;
        let bpm = estimate_bpm(&buffer.first_channel(), buffer.sample_rate);
        info!(bpm, duration_secs = buffer.duration_secs(), "guide track loaded");

        self.buffer = Some(buffer);
        self.bpm = Some(bpm);
        Ok(bpm)
    }

    pub fn bpm(&self) -> Option<u32> {
        self.bpm
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.clock
            .as_ref()
            .is_some_and(|c| !c.thread.is_finished())
    }

    /// Start playback from the top of the loaded track. No-op when nothing
    /// is loaded or playback is already running.
    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        let Some(buffer) = self.buffer.clone() else {
            return;
        };
        let Some(bpm) = self.bpm else {
            return;
        };

        self.stop();

        let total = buffer.duration_secs();
        self.output.resume();
        self.output.schedule(buffer, self.output.now());

        let period = Duration::from_secs_f64(60.0 / bpm as f64);
        self.clock = Some(spawn_beat_clock(
            self.events.clone(),
            period,
            Duration::from_secs_f64(total),
        ));
    }

    /// Stop playback and the beat clock. Idempotent.
    pub fn stop(&mut self) {
        if let Some(clock) = self.clock.take() {
            // Thread may have already ended with the track.
            let _ = clock.stop_tx.send(());
            let _ = clock.thread.join();
        }
        self.output.clear_scheduled();
    }
}

impl Drop for GuideTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_beat_clock(events: EventBus, period: Duration, total: Duration) -> BeatClock {
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let thread = std::thread::spawn(move || {
        let ticker = tick(period);
        // The first beat fires one full period after playback starts,
        // interval-timer style.
        let beats_total = (total.as_secs_f64() / period.as_secs_f64()).floor() as u64;
        let mut count: u64 = 0;

        loop {
            crossbeam_channel::select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    // No beat fits past the end of the track.
                    if count >= beats_total {
                        break;
                    }
                    events.emit(EngineEvent::Beat((count % 4 + 1) as u8));
                    count += 1;
                }
            }
        }
    });
    BeatClock { stop_tx, thread }
}
