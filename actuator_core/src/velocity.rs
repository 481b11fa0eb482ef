//! Real velocity from consecutive (position, timestamp) samples.
//!
//! Velocity uses the full-precision interval; `dt_ms` is reported in whole
//! milliseconds, so a sub-millisecond cycle shows `dt_ms == 0` with a real velocity.

use std::time::Duration;

/// Output of one estimator update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocitySample {
    /// Whole milliseconds since the previous sample; 0 for the first one.
    pub dt_ms: u64,
    /// Millimetres per millisecond.
    pub mm_per_ms: f64,
}

/// Keeps exactly one prior sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityEstimator {
    prev: Option<(f64, Duration)>,
}

impl VelocityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the prior sample; the next update is treated as the first.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// `t` is the sample time relative to any fixed epoch.
    pub fn update(&mut self, position_mm: f64, t: Duration) -> VelocitySample {
        let out = match self.prev {
            None => VelocitySample::default(),
            Some((p_prev, t_prev)) => {
                let dt = t.saturating_sub(t_prev);
                let mm_per_ms = if dt.is_zero() {
                    0.0
                } else {
                    (position_mm - p_prev) / (dt.as_secs_f64() * 1000.0)
                };
                VelocitySample {
                    dt_ms: crate::util::duration_ms(dt),
                    mm_per_ms,
                }
            }
        };
        self.prev = Some((position_mm, t));
        out
    }
}
