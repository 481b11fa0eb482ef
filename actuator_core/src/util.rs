//! Common time/period helpers for actuator_core.

use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Shortest allowed cycle period for fixed pacing.
pub const MIN_CYCLE_PERIOD_MS: u64 = 5;

/// Compute the period in milliseconds for a given loop rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 millisecond.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    debug_assert!(hz > 0, "refresh_hz must be > 0");
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Fixed-pacing cycle period: `max(1000 / hz, MIN_CYCLE_PERIOD_MS)`.
#[inline]
pub fn cycle_period(hz: u32) -> Duration {
    Duration::from_millis(period_ms(hz).max(MIN_CYCLE_PERIOD_MS))
}

/// Saturating conversion of a `Duration` to whole milliseconds.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
