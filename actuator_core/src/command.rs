//! Command gateway: one logical command, one `(code, value)` exchange.

use actuator_traits::{CommandCode, Transport};
use eyre::WrapErr;
use tracing::debug;

use crate::config::BoardTuning;
use crate::error::Result;
use crate::hw_error::map_transport_error;

/// Saturate a clamped raw value into the board's 16-bit field.
#[inline]
fn to_wire(v: i32) -> u16 {
    v.clamp(0, i32::from(u16::MAX)) as u16
}

/// Thin typed wrapper over a [`Transport`]. No retries, no buffering.
#[derive(Debug)]
pub struct Gateway<T: Transport> {
    transport: T,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn open(&mut self, device_index: u8) -> Result<()> {
        self.transport
            .open(device_index)
            .map_err(|e| eyre::Report::new(map_transport_error(&*e)))
            .wrap_err_with(|| format!("open board {device_index}"))
    }

    pub fn write(&mut self, code: CommandCode, value: u16) -> Result<u16> {
        let reply = self
            .transport
            .write_code(code.code(), value)
            .map_err(|e| eyre::Report::new(map_transport_error(&*e)))
            .wrap_err(code.name())?;
        debug!(command = code.name(), value, reply, "board command");
        Ok(reply)
    }

    /// Raw encoder position.
    pub fn get_feedback(&mut self) -> Result<u16> {
        self.write(CommandCode::GetFeedback, 0)
    }

    /// `raw` must already be clamped by the limit guard.
    pub fn set_position(&mut self, raw: i32) -> Result<()> {
        self.write(CommandCode::SetPosition, to_wire(raw)).map(drop)
    }

    /// `raw` must already be clamped by the limit guard.
    pub fn set_speed(&mut self, raw: i32) -> Result<()> {
        self.write(CommandCode::SetSpeed, to_wire(raw)).map(drop)
    }

    pub fn set_accuracy(&mut self, accuracy: u16) -> Result<()> {
        self.write(CommandCode::SetAccuracy, accuracy).map(drop)
    }

    pub fn apply_tuning(&mut self, tuning: &BoardTuning) -> Result<()> {
        for &(code, value) in &tuning.writes {
            self.write(code, value)?;
        }
        Ok(())
    }
}
