//! Board transports for the linear actuator controller.
//!
//! - [`packet::PacketTransport`]: 3-byte framing over any `Read + Write` stream.
//! - [`sim::SimulatedActuator`]: deterministic in-process board for tests and dry runs.
//! - `serial` (feature `hardware`): serial-port backend built on `serial2`.
pub mod error;
pub mod packet;
pub mod sim;
pub mod util;

#[cfg(feature = "hardware")]
pub mod serial;

pub use error::HwError;
pub use packet::PacketTransport;
pub use sim::{SimMonitor, SimulatedActuator};
