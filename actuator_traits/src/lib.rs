//! Hardware-facing seams shared by the actuator workspace.
//!
//! - [`Transport`]: the point-to-point link to the actuator board.
//! - [`Clock`]: monotonic time used for cycle timestamps and pacing.
//! - [`CommandCode`]: the board's command table.
pub mod clock;
pub mod codes;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use codes::CommandCode;

/// Boxed error returned across the trait boundary; mapped to typed errors by the core.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Raw link to an actuator control board.
///
/// Every logical command is one `(code, value)` pair. The transport does not
/// retry or buffer; failures are surfaced to the caller as-is.
pub trait Transport {
    /// Open the board identified by `device_index`.
    fn open(&mut self, device_index: u8) -> Result<(), TransportError>;

    /// Send one command and return the board's raw response value.
    fn write_code(&mut self, code: u8, value: u16) -> Result<u16, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, device_index: u8) -> Result<(), TransportError> {
        (**self).open(device_index)
    }

    fn write_code(&mut self, code: u8, value: u16) -> Result<u16, TransportError> {
        (**self).write_code(code, value)
    }
}
