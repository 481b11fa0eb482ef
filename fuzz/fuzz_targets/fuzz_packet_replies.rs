#![no_main]
use std::io::{Read, Write};
use std::time::Duration;

use actuator_hardware::PacketTransport;
use actuator_traits::{CommandCode, Transport};
use libfuzzer_sys::fuzz_target;

/// Replays fuzzer bytes as the board's replies and swallows requests.
struct Replay {
    data: Vec<u8>,
    pos: usize,
}

impl Read for Replay {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let rest = &self.data[self.pos..];
        let n = buf.len().min(rest.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for Replay {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let bytes = data.to_vec();
    let mut t = PacketTransport::new(
        move |_| {
            Ok(Replay {
                data: bytes.clone(),
                pos: 0,
            })
        },
        Duration::from_millis(1),
    );
    if t.open(1).is_err() {
        return;
    }
    // Truncated or mismatched replies must surface as errors, never a panic.
    for _ in 0..=data.len() / 3 {
        if t.write_code(CommandCode::GetFeedback.code(), 0).is_err() {
            break;
        }
    }
});
