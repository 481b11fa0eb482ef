//! Runtime configuration types for the actuator core.
//!
//! These are the structs used by `ActuatorCore` and the runner.
//! They are separate from the TOML-deserialized config in `actuator_config`.

use std::time::Duration;

use actuator_traits::CommandCode;

/// Settings applied once at connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorSettings {
    /// Settling tolerance in raw counts; also written to the board.
    pub accuracy: u16,
    pub default_velocity: i32,
    pub default_position: i32,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            accuracy: 5,
            default_velocity: 600,
            default_position: 500,
        }
    }
}

/// Optional board registers written after `set_accuracy` at connect.
///
/// Entries are written in insertion order; values pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardTuning {
    pub writes: Vec<(CommandCode, u16)>,
}

/// How the runner paces cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Cycle starts are at least this far apart.
    Fixed(Duration),
    /// No sleep; the feedback round trip paces the loop.
    Uncapped,
}

impl Pacing {
    /// Fixed pacing at `hz`, honouring the 5 ms floor.
    pub fn fixed_hz(hz: u32) -> Self {
        Self::Fixed(crate::util::cycle_period(hz))
    }

    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Fixed(p) => Some(*p),
            Self::Uncapped => None,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::fixed_hz(60)
    }
}
