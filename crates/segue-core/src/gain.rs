//! Linear gain ramp for click-free play/pause edges.

/// Per-sample linear gain ramp.
///
/// `set_immediate` cancels any in-flight ramp, so a stale ramp scheduled
/// before a state change can never reopen a silenced output path.
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    samples_remaining: u32,
    sample_rate: f32,
}

impl GainRamp {
    pub fn new(initial: f32, sample_rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            samples_remaining: 0,
            sample_rate,
        }
    }

    /// Jump to `value` now, cancelling any in-flight ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.samples_remaining = 0;
    }

    /// Ramp linearly from the current value to `target` over `seconds`.
    pub fn ramp_to(&mut self, target: f32, seconds: f32) {
        self.target = target;
        self.samples_remaining = (seconds * self.sample_rate).max(1.0) as u32;
        self.step = (self.target - self.current) / self.samples_remaining as f32;
    }

    /// Call once per output frame.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.step;
            self.samples_remaining -= 1;

            // Snap to target when done to avoid floating point drift
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }

        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.samples_remaining > 0
    }
}
