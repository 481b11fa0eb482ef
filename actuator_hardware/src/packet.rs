//! Three-byte request/reply framing used by the actuator control board.
//!
//! Request: `[code, value_lo, value_hi]`. Reply: `[code, value_lo, value_hi]`,
//! where the reply value is `lo | hi << 8` and the reply must echo the request code.
use std::io::{Read, Write};
use std::time::Duration;

use actuator_traits::{Transport, TransportError};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::read_exact_with_timeout;

pub const PACKET_LEN: usize = 3;

const REPLY_POLL: Duration = Duration::from_micros(500);

#[inline]
pub fn encode(code: u8, value: u16) -> [u8; PACKET_LEN] {
    let [lo, hi] = value.to_le_bytes();
    [code, lo, hi]
}

/// Split a reply into `(echoed_code, value)`.
#[inline]
pub fn decode(reply: [u8; PACKET_LEN]) -> (u8, u16) {
    (reply[0], u16::from_le_bytes([reply[1], reply[2]]))
}

type Opener<IO> = Box<dyn FnMut(u8) -> Result<IO> + Send>;

/// `Transport` over any byte stream that speaks the packet framing.
///
/// The stream is produced lazily by `opener` when `open(device_index)` is called.
pub struct PacketTransport<IO> {
    opener: Opener<IO>,
    io: Option<IO>,
    reply_timeout: Duration,
}

impl<IO: Read + Write> PacketTransport<IO> {
    pub fn new(
        opener: impl FnMut(u8) -> Result<IO> + Send + 'static,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            opener: Box::new(opener),
            io: None,
            reply_timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        self.io.is_some()
    }

    fn exchange(&mut self, code: u8, value: u16) -> Result<u16> {
        let io = self.io.as_mut().ok_or(HwError::NotOpen)?;
        io.write_all(&encode(code, value))?;
        io.flush()?;

        let mut reply = [0u8; PACKET_LEN];
        read_exact_with_timeout(io, &mut reply, self.reply_timeout, REPLY_POLL)?;
        let (echo, response) = decode(reply);
        trace!(code, value, echo, response, "board exchange");
        if echo != code {
            return Err(HwError::Protocol(format!(
                "reply echoes 0x{echo:02X}, expected 0x{code:02X}"
            )));
        }
        Ok(response)
    }
}

impl<IO: Read + Write> Transport for PacketTransport<IO> {
    fn open(&mut self, device_index: u8) -> std::result::Result<(), TransportError> {
        let io = (self.opener)(device_index)?;
        self.io = Some(io);
        debug!(device_index, "board link open");
        Ok(())
    }

    fn write_code(&mut self, code: u8, value: u16) -> std::result::Result<u16, TransportError> {
        Ok(self.exchange(code, value)?)
    }
}
