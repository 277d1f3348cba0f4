//! Deterministic tweens.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Decelerating cubic: `1 - (1 - t)^3`.
    CubicOut,
}

impl Easing {
    /// Map linear progress `t` (clamped to 0..=1) to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// One channel moving from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub channel: Channel,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(channel: Channel, from: f64, to: f64, duration: Duration, easing: Easing) -> Self {
        Self {
            channel,
            from,
            to,
            duration,
            easing,
        }
    }

    /// Value at `elapsed`. Lands exactly on `to` once the duration is over.
    pub fn sample(&self, elapsed: Duration) -> f64 {
        if elapsed >= self.duration || self.duration.is_zero() {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
