//! Human-readable error descriptions and structured JSON error formatting.

use actuator_core::error::{ActuatorError, BuildError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTransport => {
                "What happened: No board transport was provided to the controller.\nLikely causes: The serial or simulated transport failed to initialize or was not wired into the builder.\nHow to fix: Ensure the transport is created successfully and passed via with_transport(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/actuator_config.toml for a sample."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<ActuatorError>() {
        return match ae {
            ActuatorError::Connection(reason) => format!(
                "What happened: Could not connect to the actuator board ({reason}).\nLikely causes: Board unplugged, wrong device.index, or the port listed in [hardware].ports is missing or busy.\nHow to fix: Check the USB cable and power, verify device.index and [hardware].ports, then rerun."
            ),
            ActuatorError::Timeout => {
                "What happened: The board did not answer in time.\nLikely causes: Loose cable, wrong baud rate, or hardware.read_timeout_ms set too low.\nHow to fix: Check the link and [hardware].baud_rate, and consider raising hardware.read_timeout_ms.".to_string()
            }
            ActuatorError::Transport(reason) if reason.to_ascii_lowercase().contains("timeout") => format!(
                "What happened: The control loop stopped because the board stopped answering ({reason}).\nLikely causes: Cable unplugged mid-run, board reset, or hardware.read_timeout_ms set too low.\nHow to fix: Reconnect the board and rerun; raise hardware.read_timeout_ms if replies are slow."
            ),
            ActuatorError::Transport(reason) => format!(
                "What happened: The control loop stopped on a transport fault ({reason}).\nLikely causes: Board disconnected or replying with malformed packets.\nHow to fix: Reconnect the board and rerun with --log-level=debug to see the failing command."
            ),
            ActuatorError::Config(reason) => format!(
                "What happened: Configuration could not be used ({reason}).\nLikely causes: Missing file, TOML syntax error, missing [device] section, or out-of-range values.\nHow to fix: Edit the config file, then rerun."
            ),
            ActuatorError::InvalidBounds { min, max } => format!(
                "What happened: Oscillation bounds are invalid (min {min}, max {max}).\nLikely causes: MIN is not below MAX once both are clamped to the position limits.\nHow to fix: Pass a MIN smaller than MAX inside [limits].position_min..position_max."
            ),
            ActuatorError::State(reason) => format!(
                "What happened: {reason}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = format!("{err:#}");
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 connection, 3 transport fault, 4 configuration, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 4;
    }
    match err.downcast_ref::<ActuatorError>() {
        Some(ActuatorError::Connection(_)) => 2,
        Some(ActuatorError::Transport(_) | ActuatorError::Timeout) => 3,
        Some(ActuatorError::Config(_)) => 4,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<ActuatorError>() {
        Some(ActuatorError::Connection(_)) => "Connection",
        Some(ActuatorError::Transport(_)) => "Transport",
        Some(ActuatorError::Timeout) => "Timeout",
        Some(ActuatorError::Config(_)) => "Config",
        Some(ActuatorError::InvalidBounds { .. }) => "InvalidBounds",
        Some(ActuatorError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
