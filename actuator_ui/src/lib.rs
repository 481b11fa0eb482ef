#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Text rendering of actuator telemetry for terminal front-ends.
//!
//! Labels follow the reference control panel: refresh rate with one decimal,
//! metric values with two.
use std::fmt::Write as _;

use actuator_core::{Limits, Telemetry};

pub const CONNECTED_TEXT: &str = "Connected.";

/// `Refresh Rate: 62.5Hz`; a zero `dt` has no rate and renders as `--`.
pub fn format_refresh_rate(dt_ms: u64) -> String {
    if dt_ms == 0 {
        return "Refresh Rate: --Hz".to_string();
    }
    format!("Refresh Rate: {:.1}Hz", 1000.0 / dt_ms as f64)
}

pub fn format_position_mm(mm: f64) -> String {
    format!("{mm:.2} mm")
}

pub fn format_velocity_percent(pct: f64) -> String {
    format!("{pct:.2}%")
}

/// Real velocity in mm/s from the core's mm/ms.
pub fn format_real_velocity(mm_per_ms: f64) -> String {
    format!("{:.2}mm/s", mm_per_ms * 1000.0)
}

/// Text of the oscillation toggle button for the current state.
pub fn oscillate_button_text(active: bool) -> &'static str {
    if active { "Stop!" } else { "Oscillate!" }
}

/// Fixed-width bar showing `raw` within the position limits.
pub fn position_bar(raw: i32, limits: &Limits, width: usize) -> String {
    let width = width.max(1);
    let span = f64::from(limits.position_max() - limits.position_min());
    let clamped = limits.clamp_position(raw);
    let frac = f64::from(clamped - limits.position_min()) / span;
    let filled = ((frac * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.extend(std::iter::repeat_n('#', filled));
    bar.extend(std::iter::repeat_n('-', width - filled));
    bar.push(']');
    bar
}

/// One status line for a telemetry snapshot.
pub fn render_line(t: &Telemetry, limits: &Limits) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} | pos {} ({}) {} | vel {} ({}) | real {} | [{}]",
        format_refresh_rate(t.dt_ms),
        t.raw_position,
        format_position_mm(t.metric_position_mm),
        position_bar(i32::from(t.raw_position), limits, 20),
        t.raw_velocity,
        format_velocity_percent(t.metric_velocity_percent),
        format_real_velocity(t.real_velocity_mm_per_ms),
        oscillate_button_text(t.oscillation_active),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Telemetry {
        Telemetry {
            dt_ms: 16,
            timestamp_ms: 160,
            raw_position: 512,
            metric_position_mm: 50.0,
            raw_velocity: 600,
            metric_velocity_percent: 58.59375,
            real_velocity_mm_per_ms: 0.05,
            oscillation_active: true,
        }
    }

    #[rstest]
    #[case(16, "Refresh Rate: 62.5Hz")]
    #[case(5, "Refresh Rate: 200.0Hz")]
    #[case(0, "Refresh Rate: --Hz")]
    fn refresh_rate_label(#[case] dt: u64, #[case] expected: &str) {
        assert_eq!(format_refresh_rate(dt), expected);
    }

    #[test]
    fn metric_labels() {
        assert_eq!(format_position_mm(12.345), "12.35 mm");
        assert_eq!(format_velocity_percent(58.59375), "58.59%");
        assert_eq!(format_real_velocity(0.05), "50.00mm/s");
        assert_eq!(format_real_velocity(-0.2), "-200.00mm/s");
    }

    #[test]
    fn button_text_toggles() {
        assert_eq!(oscillate_button_text(false), "Oscillate!");
        assert_eq!(oscillate_button_text(true), "Stop!");
    }

    #[rstest]
    #[case(50, "[----------]")]
    #[case(500, "[#####-----]")]
    #[case(950, "[##########]")]
    #[case(2000, "[##########]")]
    fn bar_tracks_limits(#[case] raw: i32, #[case] expected: &str) {
        assert_eq!(position_bar(raw, &Limits::default(), 10), expected);
    }

    #[test]
    fn line_contains_all_fields() {
        let line = render_line(&sample(), &Limits::default());
        for needle in ["62.5Hz", "pos 512", "50.00 mm", "vel 600", "58.59%", "50.00mm/s", "[Stop!]"] {
            assert!(line.contains(needle), "{needle:?} missing from {line}");
        }
    }
}
