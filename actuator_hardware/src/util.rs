use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Fill `buf` from `reader`, or fail with `HwError::Timeout` once `timeout` expires.
///
/// Empty reads and `WouldBlock`/`TimedOut`/`Interrupted` errors are retried after
/// `poll_interval`, so a port configured with a short OS timeout does not spin.
pub fn read_exact_with_timeout(
    reader: &mut impl Read,
    buf: &mut [u8],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {}
            Ok(n) => {
                filled += n;
                continue;
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(HwError::Io(e)),
        }
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
