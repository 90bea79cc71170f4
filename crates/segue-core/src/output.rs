//! Output graph: absolute-time PCM scheduling with a ramped master gain.
//!
//! The session scheduler and guide track talk to an [`AudioOutput`], which
//! owns an output clock and mixes scheduled buffers into the device stream.
//! [`CpalOutput`] is the real device-backed implementation; [`VirtualOutput`]
//! provides a manually advanced clock for headless use and tests.

use crate::PcmBuffer;
use parking_lot::Mutex;

/// Abstract audio output graph.
///
/// Scheduled buffers transfer ownership to the output and are never mutated
/// afterwards. The master gain node is exclusively owned by the session
/// controller; no other component may mutate it.
pub trait AudioOutput: Send + Sync {
    /// Current output-clock time in seconds.
    fn now(&self) -> f64;

    /// Schedule `buffer` to start exactly at `start_secs` on the output clock.
    fn schedule(&self, buffer: PcmBuffer, start_secs: f64);

    /// Jump the master gain to `from`, then ramp linearly to `to` over
    /// `seconds`. The jump cancels any in-flight ramp, so a stale ramp can
    /// never reopen a silenced path.
    fn ramp_gain(&self, from: f32, to: f32, seconds: f32);

    /// Ramp the master gain to zero over `seconds`, then drop every
    /// scheduled source once silent. Used on pause so faded-out audio
    /// cannot resurface on the next play.
    fn fade_out_and_clear(&self, seconds: f32);

    /// Drop all scheduled sources immediately.
    fn clear_scheduled(&self);

    /// Ensure the output stream is running. Idempotent.
    fn resume(&self);
}

/// Gain operations recorded by [`VirtualOutput`].
#[derive(Debug, Clone, PartialEq)]
pub enum GainOp {
    Ramp { from: f32, to: f32, seconds: f32 },
    FadeOutAndClear { seconds: f32 },
}

#[derive(Default)]
struct VirtualState {
    now: f64,
    scheduled: Vec<(f64, f64)>, // (start, duration)
    gain_ops: Vec<GainOp>,
    resumed: bool,
}

/// Software output with a manually advanced clock.
///
/// Records scheduled start times and gain operations instead of producing
/// sound; `advance` moves the clock forward.
#[derive(Default)]
pub struct VirtualOutput {
    state: Mutex<VirtualState>,
}

impl VirtualOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the output clock by `secs`.
    pub fn advance(&self, secs: f64) {
        self.state.lock().now += secs;
    }

    /// Start times of every buffer scheduled so far, in scheduling order.
    pub fn scheduled_starts(&self) -> Vec<f64> {
        self.state.lock().scheduled.iter().map(|s| s.0).collect()
    }

    /// Gain operations in the order they were issued.
    pub fn gain_ops(&self) -> Vec<GainOp> {
        self.state.lock().gain_ops.clone()
    }

    pub fn resumed(&self) -> bool {
        self.state.lock().resumed
    }
}

impl AudioOutput for VirtualOutput {
    fn now(&self) -> f64 {
        self.state.lock().now
    }

    fn schedule(&self, buffer: PcmBuffer, start_secs: f64) {
        let duration = buffer.duration_secs();
        self.state.lock().scheduled.push((start_secs, duration));
    }

    fn ramp_gain(&self, from: f32, to: f32, seconds: f32) {
        self.state
            .lock()
            .gain_ops
            .push(GainOp::Ramp { from, to, seconds });
    }

    fn fade_out_and_clear(&self, seconds: f32) {
        let mut state = self.state.lock();
        state.gain_ops.push(GainOp::FadeOutAndClear { seconds });
        state.scheduled.clear();
    }

    fn clear_scheduled(&self) {
        self.state.lock().scheduled.clear();
    }

    fn resume(&self) {
        self.state.lock().resumed = true;
    }
}

#[cfg(feature = "cpal-output")]
pub use device::CpalOutput;

#[cfg(feature = "cpal-output")]
mod device {
    use super::AudioOutput;
    use crate::{Error, GainRamp, PcmBuffer, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use parking_lot::Mutex;
    use ringbuf::{
        traits::{Producer, Split},
        HeapCons, HeapProd, HeapRb,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Wrapper to hold a `cpal::Stream` in a `Send` context.
    ///
    /// `cpal::Stream` is `!Send` due to platform internals. This is safe
    /// because the stream is only created and dropped behind the output's
    /// Mutex and never moved across threads after creation.
    struct StreamHandle(#[allow(dead_code)] cpal::Stream);

    // SAFETY: the stream stays on the thread that created it until the
    // output is dropped; access is serialized by the Mutex around it.
    unsafe impl Send for StreamHandle {}

    struct Source {
        start_frame: u64,
        buffer: PcmBuffer,
    }

    impl Source {
        /// Buffer length measured in device frames.
        fn device_frames(&self, device_rate: u32) -> u64 {
            self.buffer.frames() as u64 * device_rate as u64 / self.buffer.sample_rate as u64
        }

        /// Stereo sample pair at a device-clock frame, or `None` past the end.
        fn sample_at(&self, device_frame: u64, device_rate: u32) -> Option<(f32, f32)> {
            if device_frame < self.start_frame {
                return None;
            }
            let offset = device_frame - self.start_frame;
            // Nearest-sample rate conversion; chunks are 48 kHz and devices
            // commonly run at 48 kHz, so this is usually an identity map.
            let frame = (offset * self.buffer.sample_rate as u64 / device_rate as u64) as usize;
            if frame >= self.buffer.frames() {
                return None;
            }
            let ch = self.buffer.channels as usize;
            let l = self.buffer.samples[frame * ch];
            let r = self.buffer.samples[frame * ch + (ch - 1)];
            Some((l, r))
        }
    }

    struct MixerState {
        sources: Vec<Source>,
        gain: GainRamp,
        purge_when_silent: bool,
        tap: Option<HeapProd<f32>>,
    }

    /// CPAL-backed output: mixes scheduled buffers, applies the master gain
    /// ramp per frame, and optionally feeds a mono post-gain tap for the
    /// level monitor.
    pub struct CpalOutput {
        mixer: Arc<Mutex<MixerState>>,
        frames_elapsed: Arc<AtomicU64>,
        sample_rate: u32,
        device_index: Option<usize>,
        stream: Mutex<Option<StreamHandle>>,
    }

    impl CpalOutput {
        pub fn new(device_index: Option<usize>) -> Result<Self> {
            let device = Self::get_device(device_index)?;
            let config = device.default_output_config()?;

            Ok(Self {
                mixer: Arc::new(Mutex::new(MixerState {
                    sources: Vec::new(),
                    gain: GainRamp::new(1.0, config.sample_rate().0 as f32),
                    purge_when_silent: false,
                    tap: None,
                })),
                frames_elapsed: Arc::new(AtomicU64::new(0)),
                sample_rate: config.sample_rate().0,
                device_index,
                stream: Mutex::new(None),
            })
        }

        /// Create the mono post-gain tap. Call before `start`.
        pub fn create_tap(&self, capacity: usize) -> HeapCons<f32> {
            let rb = HeapRb::<f32>::new(capacity);
            let (prod, cons) = rb.split();
            self.mixer.lock().tap = Some(prod);
            cons
        }

        pub fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        /// Open the device stream and start rendering. Idempotent.
        pub fn start(&self) -> Result<()> {
            let mut slot = self.stream.lock();
            if slot.is_some() {
                return Ok(());
            }

            let device = Self::get_device(self.device_index)?;
            let config = device.default_output_config()?;

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => self.build_stream::<f32>(&device, &config.into())?,
                cpal::SampleFormat::I16 => self.build_stream::<i16>(&device, &config.into())?,
                cpal::SampleFormat::U16 => self.build_stream::<u16>(&device, &config.into())?,
                format => {
                    return Err(Error::InvalidConfig(format!(
                        "Unsupported sample format: {:?}",
                        format
                    )));
                }
            };

            stream.play()?;
            *slot = Some(StreamHandle(stream));
            Ok(())
        }

        fn get_device(index: Option<usize>) -> Result<cpal::Device> {
            let host = cpal::default_host();

            if let Some(idx) = index {
                let devices: Vec<_> = host
                    .output_devices()
                    .map_err(|e| Error::InvalidDevice(e.to_string()))?
                    .collect();
                let device_count = devices.len();
                devices.into_iter().nth(idx).ok_or_else(|| {
                    Error::InvalidDevice(format!(
                        "Output device index {} out of range (available: {})",
                        idx, device_count
                    ))
                })
            } else {
                host.default_output_device()
                    .ok_or_else(|| Error::InvalidDevice("No output device available".to_string()))
            }
        }

        fn build_stream<T>(
            &self,
            device: &cpal::Device,
            config: &cpal::StreamConfig,
        ) -> Result<cpal::Stream>
        where
            T: cpal::SizedSample + cpal::FromSample<f32>,
        {
            let channels = config.channels as usize;
            let device_rate = config.sample_rate.0;
            let mixer = Arc::clone(&self.mixer);
            let frames_elapsed = Arc::clone(&self.frames_elapsed);

            let stream = device.build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    let mut mix = vec![0.0f32; frames * 2];

                    {
                        let mut state = mixer.lock();
                        let base = frames_elapsed.load(Ordering::Relaxed);

                        for i in 0..frames {
                            let frame = base + i as u64;
                            let (mut l, mut r) = (0.0f32, 0.0f32);
                            for source in &state.sources {
                                if let Some((sl, sr)) = source.sample_at(frame, device_rate) {
                                    l += sl;
                                    r += sr;
                                }
                            }
                            let g = state.gain.next_sample();
                            mix[i * 2] = l * g;
                            mix[i * 2 + 1] = r * g;
                        }

                        let end = base + frames as u64;
                        state
                            .sources
                            .retain(|s| s.start_frame + s.device_frames(device_rate) > end);

                        if state.purge_when_silent
                            && !state.gain.is_ramping()
                            && state.gain.current() <= f32::EPSILON
                        {
                            state.sources.clear();
                            state.purge_when_silent = false;
                        }

                        if let Some(tap) = state.tap.as_mut() {
                            for i in 0..frames {
                                let mono = (mix[i * 2] + mix[i * 2 + 1]) * 0.5;
                                // Monitor stopped or lagging: drop samples.
                                let _ = tap.try_push(mono);
                            }
                        }

                        frames_elapsed.store(end, Ordering::Relaxed);
                    }

                    for (i, sample) in data.iter_mut().enumerate() {
                        let channel = i % channels;
                        let frame = i / channels;
                        let value = if channel < 2 {
                            mix.get(frame * 2 + channel).copied().unwrap_or(0.0)
                        } else {
                            0.0
                        };
                        *sample = T::from_sample(value);
                    }
                },
                |_err| {
                    // Audio stream error - cannot log from the callback
                },
                None,
            )?;

            Ok(stream)
        }
    }

    impl AudioOutput for CpalOutput {
        fn now(&self) -> f64 {
            self.frames_elapsed.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
        }

        fn schedule(&self, buffer: PcmBuffer, start_secs: f64) {
            let start_frame = (start_secs * self.sample_rate as f64).round() as u64;
            self.mixer.lock().sources.push(Source {
                start_frame,
                buffer,
            });
        }

        fn ramp_gain(&self, from: f32, to: f32, seconds: f32) {
            let mut state = self.mixer.lock();
            state.purge_when_silent = false;
            state.gain.set_immediate(from);
            state.gain.ramp_to(to, seconds);
        }

        fn fade_out_and_clear(&self, seconds: f32) {
            let mut state = self.mixer.lock();
            let current = state.gain.current();
            state.gain.set_immediate(current);
            state.gain.ramp_to(0.0, seconds);
            state.purge_when_silent = true;
        }

        fn clear_scheduled(&self) {
            self.mixer.lock().sources.clear();
        }

        fn resume(&self) {
            if let Err(e) = self.start() {
                tracing::warn!("failed to resume output stream: {e}");
            }
        }
    }
}
