//! Coalescing rate limiter.
//!
//! Guarantees at most one emission per window using the most recent value;
//! superseded intermediate values are dropped, not queued. Callers drive it
//! from an event loop: `offer` may fire immediately (leading edge), and
//! `next_deadline`/`take_due` flush a pending value once the window elapses.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Coalescer<T> {
    window: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Coalescer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
            pending: None,
        }
    }

    /// Offer a value; returns it back if it may fire now, otherwise holds it
    /// (replacing any previously pending value) until the window elapses.
    pub fn offer(&mut self, value: T) -> Option<T> {
        self.offer_at(value, Instant::now())
    }

    pub fn offer_at(&mut self, value: T, now: Instant) -> Option<T> {
        match self.last_fired {
            Some(t) if now.duration_since(t) < self.window => {
                self.pending = Some(value);
                None
            }
            _ => {
                self.last_fired = Some(now);
                self.pending = None;
                Some(value)
            }
        }
    }

    /// When the currently pending value becomes eligible, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_fired.map(|t| t + self.window)
    }

    /// Take the pending value if its window has elapsed.
    pub fn take_due(&mut self) -> Option<T> {
        self.take_due_at(Instant::now())
    }

    pub fn take_due_at(&mut self, now: Instant) -> Option<T> {
        let deadline = self.next_deadline()?;
        if now >= deadline {
            self.last_fired = Some(now);
            self.pending.take()
        } else {
            None
        }
    }
}
