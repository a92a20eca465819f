use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Call `poll` until it yields a value or `timeout` expires.
///
/// Errors from `poll` abort immediately. Sleeps `poll_interval` between
/// attempts so a slow adapter does not spin the CPU.
pub fn poll_until<T>(
    mut poll: impl FnMut() -> Result<Option<T>>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(v) = poll()? {
            return Ok(v);
        }
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
}
