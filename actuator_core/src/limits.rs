//! Limit guard: clamps every raw position/velocity before it reaches the board.

use crate::error::BuildError;

/// Raw bounds per axis. Invariant: `min < max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    position_min: i32,
    position_max: i32,
    velocity_min: i32,
    velocity_max: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            position_min: 50,
            position_max: 950,
            velocity_min: 100,
            velocity_max: 1000,
        }
    }
}

impl Limits {
    pub fn new(
        position_min: i32,
        position_max: i32,
        velocity_min: i32,
        velocity_max: i32,
    ) -> Result<Self, BuildError> {
        if position_min >= position_max {
            return Err(BuildError::InvalidConfig(
                "position_min must be < position_max",
            ));
        }
        if velocity_min >= velocity_max {
            return Err(BuildError::InvalidConfig(
                "velocity_min must be < velocity_max",
            ));
        }
        Ok(Self {
            position_min,
            position_max,
            velocity_min,
            velocity_max,
        })
    }

    #[inline]
    pub fn clamp_position(&self, v: i32) -> i32 {
        v.min(self.position_max).max(self.position_min)
    }

    #[inline]
    pub fn clamp_velocity(&self, v: i32) -> i32 {
        v.min(self.velocity_max).max(self.velocity_min)
    }

    pub fn position_min(&self) -> i32 {
        self.position_min
    }

    pub fn position_max(&self) -> i32 {
        self.position_max
    }

    pub fn velocity_min(&self) -> i32 {
        self.velocity_min
    }

    pub fn velocity_max(&self) -> i32 {
        self.velocity_max
    }
}
