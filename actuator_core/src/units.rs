//! Raw encoder counts to physical units.

/// Stateless raw→physical conversion for one actuator model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    stroke_length_mm: f64,
    raw_full_scale: f64,
}

impl Default for UnitConverter {
    /// 100 mm stroke over a 10-bit encoder.
    fn default() -> Self {
        Self {
            stroke_length_mm: 100.0,
            raw_full_scale: 1024.0,
        }
    }
}

impl UnitConverter {
    /// Callers validate `stroke_length_mm > 0` and `raw_full_scale > 0`.
    pub fn new(stroke_length_mm: f64, raw_full_scale: u32) -> Self {
        Self {
            stroke_length_mm,
            raw_full_scale: f64::from(raw_full_scale),
        }
    }

    pub fn stroke_length_mm(&self) -> f64 {
        self.stroke_length_mm
    }

    pub fn raw_full_scale(&self) -> f64 {
        self.raw_full_scale
    }

    /// `raw * stroke_length / full_scale`, in millimetres.
    #[inline]
    pub fn raw_to_metric_position(&self, raw: i32) -> f64 {
        f64::from(raw) * self.stroke_length_mm / self.raw_full_scale
    }

    /// Commanded speed as a percentage of full scale.
    #[inline]
    pub fn raw_to_metric_velocity_percent(&self, raw: i32) -> f64 {
        100.0 * f64::from(raw) / self.raw_full_scale
    }
}
