//! Oscillation state machine: autonomous sweeps between two endpoints.
//!
//! The machine is a `Copy` value. Every transition returns the next state
//! alongside the position to command (if any); the control loop commits the
//! next state only once that command has reached the board, so a failed
//! write leaves the machine untouched.

use crate::error::ActuatorError;
use crate::limits::Limits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillationState {
    Idle,
    SweepingToMax,
    SweepingToMin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillator {
    pub enabled: bool,
    pub min: i32,
    pub max: i32,
    pub is_moving: bool,
    pub max_endpoint_reached: bool,
    state: OscillationState,
}

/// A state transition and the position command it requires.
pub type Transition = (Oscillator, Option<i32>);

impl Oscillator {
    /// Disabled, with the full position range as endpoints.
    pub fn new(limits: &Limits) -> Self {
        Self {
            enabled: false,
            min: limits.position_min(),
            max: limits.position_max(),
            is_moving: false,
            max_endpoint_reached: false,
            state: OscillationState::Idle,
        }
    }

    pub fn state(&self) -> OscillationState {
        self.state
    }

    /// Turn oscillation on, heading for whichever endpoint is farther from
    /// `position`. Ties go to `max`.
    pub fn enabled_towards(
        &self,
        min: i32,
        max: i32,
        position: i32,
        limits: &Limits,
    ) -> Result<Transition, ActuatorError> {
        let min = limits.clamp_position(min);
        let max = limits.clamp_position(max);
        if min >= max {
            return Err(ActuatorError::InvalidBounds { min, max });
        }
        let to_max = (max - position).abs() >= (position - min).abs();
        let (state, target) = if to_max {
            (OscillationState::SweepingToMax, max)
        } else {
            (OscillationState::SweepingToMin, min)
        };
        let next = Self {
            enabled: true,
            min,
            max,
            is_moving: true,
            max_endpoint_reached: to_max,
            state,
        };
        Ok((next, Some(target)))
    }

    /// Stop sweeping. The rod stays wherever it was last sent.
    pub fn disabled(&self) -> Self {
        Self {
            enabled: false,
            is_moving: false,
            max_endpoint_reached: false,
            state: OscillationState::Idle,
            ..*self
        }
    }

    /// One cycle: decide on a new endpoint, then check for arrival.
    ///
    /// `tolerance` is the half-accuracy band in raw counts.
    pub fn advance(&self, position: i32, tolerance: i32) -> Transition {
        if !self.enabled {
            return (*self, None);
        }
        let mut next = *self;
        let mut command = None;

        if !next.is_moving {
            if next.max_endpoint_reached {
                next.state = OscillationState::SweepingToMin;
                command = Some(next.min);
            } else {
                next.max_endpoint_reached = true;
                next.state = OscillationState::SweepingToMax;
                command = Some(next.max);
            }
            next.is_moving = true;
        }

        match next.state {
            OscillationState::SweepingToMax if (position - next.max).abs() <= tolerance => {
                next.is_moving = false;
            }
            OscillationState::SweepingToMin if (position - next.min).abs() <= tolerance => {
                next.is_moving = false;
                next.max_endpoint_reached = false;
            }
            _ => {}
        }

        (next, command)
    }
}

/// Settling band for a given board accuracy (integer half).
#[inline]
pub fn settle_tolerance(accuracy: u16) -> i32 {
    i32::from(accuracy / 2)
}
