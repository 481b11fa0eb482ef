//! `From` implementations bridging `actuator_config` types to `actuator_core` types.

use actuator_traits::CommandCode;

use crate::config::{ActuatorSettings, BoardTuning, Pacing};
use crate::error::BuildError;
use crate::limits::Limits;
use crate::units::UnitConverter;

// ── ActuatorSettings ─────────────────────────────────────────────────────────

impl From<&actuator_config::Settings> for ActuatorSettings {
    fn from(c: &actuator_config::Settings) -> Self {
        Self {
            accuracy: c.accuracy,
            default_velocity: c.default_velocity,
            default_position: c.default_position,
        }
    }
}

// ── Limits ───────────────────────────────────────────────────────────────────

impl TryFrom<&actuator_config::Limits> for Limits {
    type Error = BuildError;

    fn try_from(c: &actuator_config::Limits) -> Result<Self, Self::Error> {
        Limits::new(
            c.position_min,
            c.position_max,
            c.velocity_min,
            c.velocity_max,
        )
    }
}

// ── UnitConverter ────────────────────────────────────────────────────────────

impl From<&actuator_config::Device> for UnitConverter {
    fn from(c: &actuator_config::Device) -> Self {
        UnitConverter::new(f64::from(c.stroke_length_mm), c.raw_full_scale)
    }
}

// ── BoardTuning ──────────────────────────────────────────────────────────────

impl From<&actuator_config::BoardTuning> for BoardTuning {
    fn from(c: &actuator_config::BoardTuning) -> Self {
        let table = [
            (CommandCode::SetRetractLimit, c.retract_limit),
            (CommandCode::SetExtendLimit, c.extend_limit),
            (CommandCode::SetMovementThreshold, c.movement_threshold),
            (CommandCode::SetStallTime, c.stall_time),
            (CommandCode::SetPwmThreshold, c.pwm_threshold),
            (CommandCode::SetDerivativeThreshold, c.derivative_threshold),
            (CommandCode::SetDerivativeMaximum, c.derivative_maximum),
            (CommandCode::SetDerivativeMinimum, c.derivative_minimum),
            (CommandCode::SetPwmMaximum, c.pwm_maximum),
            (CommandCode::SetPwmMinimum, c.pwm_minimum),
            (CommandCode::SetProportionalGain, c.proportional_gain),
            (CommandCode::SetDerivativeGain, c.derivative_gain),
            (CommandCode::SetAverageRc, c.average_rc),
            (CommandCode::SetAverageAdc, c.average_adc),
        ];
        Self {
            writes: table
                .into_iter()
                .filter_map(|(code, v)| v.map(|v| (code, v)))
                .collect(),
        }
    }
}

// ── Pacing ───────────────────────────────────────────────────────────────────

impl From<&actuator_config::RunnerCfg> for Pacing {
    fn from(c: &actuator_config::RunnerCfg) -> Self {
        match c.pacing {
            actuator_config::PacingMode::Fixed => Pacing::fixed_hz(c.refresh_hz),
            actuator_config::PacingMode::Uncapped => Pacing::Uncapped,
        }
    }
}
