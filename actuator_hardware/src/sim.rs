//! Deterministic simulated actuator board.
//!
//! The rod moves toward the commanded position by a speed-proportional
//! number of counts on every feedback read, so a control loop driving it
//! converges in a predictable number of cycles regardless of wall time.
use std::sync::{Arc, Mutex, MutexGuard};

use actuator_traits::{CommandCode, Transport, TransportError};
use tracing::trace;

use crate::error::HwError;

/// Counts travelled per feedback read at full speed (speed == full scale).
pub const COUNTS_PER_READ_AT_FULL_SPEED: u32 = 32;
const SPEED_FULL_SCALE: u32 = 1024;

#[derive(Debug, Default)]
struct SimState {
    opened: bool,
    fail_open: bool,
    fail_feedback_after: Option<u64>,
    feedback_reads: u64,
    position: u16,
    target: u16,
    speed: u16,
    accuracy: u16,
    writes: Vec<(u8, u16)>,
}

/// Simulated board implementing [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedActuator {
    state: Arc<Mutex<SimState>>,
}

/// Read-only view into a [`SimulatedActuator`] that stays valid after the
/// actuator has been moved into a control loop.
#[derive(Debug, Clone)]
pub struct SimMonitor {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the rod (and its target) at `raw`.
    pub fn with_initial_position(self, raw: u16) -> Self {
        {
            let mut s = lock(&self.state);
            s.position = raw;
            s.target = raw;
        }
        self
    }

    /// Make `open` fail as if no board were attached.
    pub fn with_failed_open(self) -> Self {
        lock(&self.state).fail_open = true;
        self
    }

    /// Let `n` feedback reads succeed, then fail every following one with a timeout.
    pub fn with_feedback_failure_after(self, n: u64) -> Self {
        lock(&self.state).fail_feedback_after = Some(n);
        self
    }

    pub fn monitor(&self) -> SimMonitor {
        SimMonitor {
            state: self.state.clone(),
        }
    }

    fn travel_per_read(speed: u16) -> u16 {
        let counts = u32::from(speed) * COUNTS_PER_READ_AT_FULL_SPEED / SPEED_FULL_SCALE;
        counts.clamp(1, u32::from(u16::MAX)) as u16
    }
}

impl SimMonitor {
    pub fn position(&self) -> u16 {
        lock(&self.state).position
    }

    pub fn target(&self) -> u16 {
        lock(&self.state).target
    }

    pub fn speed(&self) -> u16 {
        lock(&self.state).speed
    }

    pub fn accuracy(&self) -> u16 {
        lock(&self.state).accuracy
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).opened
    }

    /// Every `(code, value)` pair written so far, in order.
    pub fn writes(&self) -> Vec<(u8, u16)> {
        lock(&self.state).writes.clone()
    }

    /// Values written with `code`, in order.
    pub fn writes_of(&self, code: CommandCode) -> Vec<u16> {
        lock(&self.state)
            .writes
            .iter()
            .filter(|(c, _)| *c == code.code())
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Transport for SimulatedActuator {
    fn open(&mut self, device_index: u8) -> Result<(), TransportError> {
        let mut s = lock(&self.state);
        if s.fail_open {
            return Err(Box::new(HwError::NoDevice(device_index)));
        }
        s.opened = true;
        trace!(device_index, "simulated board open");
        Ok(())
    }

    fn write_code(&mut self, code: u8, value: u16) -> Result<u16, TransportError> {
        let mut s = lock(&self.state);
        if !s.opened {
            return Err(Box::new(HwError::NotOpen));
        }
        s.writes.push((code, value));

        let reply = match CommandCode::from_code(code) {
            Some(CommandCode::GetFeedback) => {
                s.feedback_reads += 1;
                if s.fail_feedback_after.is_some_and(|n| s.feedback_reads > n) {
                    return Err(Box::new(HwError::Timeout));
                }
                let step = Self::travel_per_read(s.speed);
                s.position = if s.position < s.target {
                    s.position.saturating_add(step).min(s.target)
                } else {
                    s.position.saturating_sub(step).max(s.target)
                };
                s.position
            }
            Some(CommandCode::SetPosition) => {
                s.target = value;
                value
            }
            Some(CommandCode::SetSpeed) => {
                s.speed = value;
                value
            }
            Some(CommandCode::SetAccuracy) => {
                s.accuracy = value;
                value
            }
            Some(CommandCode::Reset) => {
                s.target = s.position;
                0
            }
            Some(_) => value,
            None => {
                return Err(Box::new(HwError::Protocol(format!(
                    "unknown command code 0x{code:02X}"
                ))));
            }
        };
        trace!(code, value, reply, "simulated exchange");
        Ok(reply)
    }
}
