//! Continuous hit points and stamina.
//!
//! The continuous value is the source of truth; the integer shown to
//! players is its ceiling, so a unit at 0.1 HP still displays 1.

use serde::{Deserialize, Serialize};

/// A vital that drains and recovers continuously within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    current: f64,
    max: u32,
}

impl Gauge {
    /// A full gauge.
    pub fn full(max: u32) -> Self {
        Self {
            current: f64::from(max),
            max,
        }
    }

    /// The continuous value.
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// The displayed integer value, `ceil(current)`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn displayed(&self) -> u32 {
        // current is within [0, max] and max fits in u32.
        self.current.ceil() as u32
    }

    /// The maximum.
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Whether the gauge is at its maximum.
    pub fn is_full(&self) -> bool {
        self.current >= f64::from(self.max)
    }

    /// Whether the gauge is empty.
    pub const fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    /// Change the maximum, clamping the current value into range.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(f64::from(max));
    }

    /// Remove up to `amount`, never going below zero.
    pub fn drain(&mut self, amount: f64) {
        self.current = (self.current - amount).max(0.0);
    }

    /// Add up to `amount`, never going above the maximum.
    pub fn fill(&mut self, amount: f64) {
        self.current = (self.current + amount).min(f64::from(self.max));
    }

    /// Recover at `rate` points per second for up to `time` seconds.
    ///
    /// Returns the part of `time` that was not needed to reach the maximum.
    pub fn recover(&mut self, rate: f64, time: f64) -> f64 {
        let missing = f64::from(self.max) - self.current;
        if missing <= 0.0 {
            return time;
        }
        if rate <= 0.0 {
            return 0.0;
        }
        let needed = missing / rate;
        if needed <= time {
            self.current = f64::from(self.max);
            time - needed
        } else {
            self.fill(rate * time);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displayed_is_ceiling() {
        let mut g = Gauge::full(200);
        g.drain(0.5);
        assert_eq!(g.displayed(), 200);
        g.drain(199.4);
        assert_eq!(g.displayed(), 1);
        g.drain(5.0);
        assert_eq!(g.displayed(), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn recover_returns_leftover() {
        let mut g = Gauge::full(200);
        g.drain(1.0);
        // 2 points/s needs 0.5 s to refill one point.
        let left = g.recover(2.0, 0.75);
        assert!((left - 0.25).abs() < 1e-12);
        assert!(g.is_full());
        assert!((g.recover(2.0, 0.1) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn partial_recovery_consumes_all_time() {
        let mut g = Gauge::full(200);
        g.drain(10.0);
        assert!(g.recover(2.0, 1.0).abs() < 1e-12);
        assert!((g.current() - 192.0).abs() < 1e-12);
    }

    #[test]
    fn lowering_max_clamps_current() {
        let mut g = Gauge::full(400);
        g.set_max(200);
        assert_eq!(g.displayed(), 200);
    }
}
