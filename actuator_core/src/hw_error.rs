//! Maps `Box<dyn Error>` from the transport boundary to typed `ActuatorError`.
//!
//! `actuator_traits::Transport` returns `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `actuator_hardware::HwError` downcasting.

use crate::error::ActuatorError;

/// Map a trait-boundary error to a typed `ActuatorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> ActuatorError {
    #[cfg(feature = "hardware-errors")]
    {
        use actuator_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => ActuatorError::Timeout,
                HwError::NoDevice(_) => ActuatorError::Connection(hw.to_string()),
                other => ActuatorError::Transport(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ActuatorError::Timeout
    } else {
        ActuatorError::Transport(s)
    }
}
