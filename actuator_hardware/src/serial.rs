use std::time::Duration;

use serial2::SerialPort;
use tracing::info;

use crate::error::HwError;
use crate::packet::PacketTransport;

/// OS-level read timeout; the packet layer keeps polling until its own deadline.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Build a packet transport whose `open(index)` opens `ports[index - 1]`.
///
/// An index of 0 or past the end of `ports` yields [`HwError::NoDevice`].
pub fn serial_transport(
    ports: Vec<String>,
    baud_rate: u32,
    reply_timeout: Duration,
) -> PacketTransport<SerialPort> {
    let opener = move |index: u8| -> Result<SerialPort, HwError> {
        let path = usize::from(index)
            .checked_sub(1)
            .and_then(|i| ports.get(i))
            .ok_or(HwError::NoDevice(index))?;
        let mut port = SerialPort::open(path, baud_rate)?;
        port.set_read_timeout(PORT_READ_TIMEOUT)?;
        info!(port = %path, baud_rate, "serial port opened");
        Ok(port)
    };
    PacketTransport::new(opener, reply_timeout)
}
