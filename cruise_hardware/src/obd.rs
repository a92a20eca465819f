//! OBD-II mode 01 reads through an ELM327-style adapter.
//!
//! The adapter is assumed to be initialised already (echo off, protocol
//! selected); only request/response framing lives here.

use std::io::{Read, Write};
use std::time::Duration;

use cruise_traits::{BoxError, VehicleSensors};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::poll_until;

pub const PID_ENGINE_RPM: u8 = 0x0C;
pub const PID_VEHICLE_SPEED: u8 = 0x0D;
pub const PID_ETHANOL_PERCENT: u8 = 0x52;

/// Byte pipe to the adapter.
pub trait ObdTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
    /// Read whatever is buffered; 0 means nothing yet.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Adapts any `Read + Write` stream (serial port file, TCP socket, test double).
pub struct IoTransport<T>(pub T);

impl<T: Read + Write> ObdTransport for IoTransport<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()?;
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn request_for(pid: u8) -> String {
    format!("01{pid:02X}\r")
}

/// Extract the data bytes of a mode 01 reply for `pid`.
///
/// Tolerates echoed requests, `SEARCHING...` banners, spacing and the
/// trailing `>` prompt.
pub fn parse_response(pid: u8, reply: &str) -> Result<Vec<u8>> {
    let header = format!("41{pid:02X}");
    for line in reply.split(['\r', '\n']) {
        let compact: String = line
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '>')
            .collect::<String>()
            .to_ascii_uppercase();
        if compact.contains("NODATA") {
            return Err(HwError::NoData { pid });
        }
        let Some(payload) = compact.strip_prefix(&header) else {
            continue;
        };
        if payload.is_empty() || payload.len() % 2 != 0 {
            return Err(HwError::Malformed(reply.trim().to_string()));
        }
        return payload
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|s| u8::from_str_radix(s, 16).ok())
                    .ok_or_else(|| HwError::Malformed(reply.trim().to_string()))
            })
            .collect();
    }
    Err(HwError::Malformed(reply.trim().to_string()))
}

/// Vehicle speed in km/h.
pub fn decode_speed(data: &[u8]) -> Result<i32> {
    match data {
        [a, ..] => Ok(i32::from(*a)),
        _ => Err(HwError::Malformed("speed: empty payload".into())),
    }
}

/// Engine speed in rpm: (256A + B) / 4.
pub fn decode_rpm(data: &[u8]) -> Result<i32> {
    match data {
        [a, b, ..] => Ok((i32::from(*a) * 256 + i32::from(*b)) / 4),
        _ => Err(HwError::Malformed("rpm: need two bytes".into())),
    }
}

/// Ethanol fuel percentage: 100A / 255.
pub fn decode_ethanol_percent(data: &[u8]) -> Result<i32> {
    match data {
        [a, ..] => Ok(i32::from(*a) * 100 / 255),
        _ => Err(HwError::Malformed("ethanol: empty payload".into())),
    }
}

pub struct ObdGateway<T> {
    transport: T,
    poll_interval: Duration,
}

impl<T: ObdTransport> ObdGateway<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            poll_interval: Duration::from_millis(2),
        }
    }

    pub fn with_poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    /// Send one mode 01 request and wait for the prompt.
    pub fn query(&mut self, pid: u8, timeout: Duration) -> Result<Vec<u8>> {
        self.transport.write_all(request_for(pid).as_bytes())?;
        let mut reply = String::new();
        let mut buf = [0u8; 64];
        let transport = &mut self.transport;
        poll_until(
            || {
                let n = transport.read_available(&mut buf)?;
                reply.push_str(&String::from_utf8_lossy(&buf[..n]));
                Ok(reply.contains('>').then_some(()))
            },
            timeout,
            self.poll_interval,
        )?;
        trace!(pid, reply = reply.trim(), "obd reply");
        parse_response(pid, &reply)
    }
}

impl<T: ObdTransport> VehicleSensors for ObdGateway<T> {
    fn read_speed(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        let data = self.query(PID_VEHICLE_SPEED, timeout)?;
        Ok(decode_speed(&data)?)
    }

    fn read_rpm(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        let data = self.query(PID_ENGINE_RPM, timeout)?;
        Ok(decode_rpm(&data)?)
    }

    fn read_fuel_percent(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        let data = self.query(PID_ETHANOL_PERCENT, timeout)?;
        Ok(decode_ethanol_percent(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::VecDeque;

    /// Answers each `\r`-terminated request with the next scripted reply.
    struct ScriptedAdapter {
        replies: VecDeque<&'static str>,
        pending: Vec<u8>,
        written: Vec<u8>,
    }

    impl ScriptedAdapter {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                pending: Vec::new(),
                written: Vec::new(),
            }
        }
    }

    impl Read for ScriptedAdapter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    impl Write for ScriptedAdapter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            if buf.contains(&b'\r')
                && let Some(r) = self.replies.pop_front()
            {
                self.pending.extend_from_slice(r.as_bytes());
            }
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(PID_VEHICLE_SPEED, "41 0D 3C\r\r>", vec![0x3C])]
    #[case(PID_ENGINE_RPM, "010C\r41 0C 1A F8 \r\r>", vec![0x1A, 0xF8])]
    #[case(PID_ETHANOL_PERCENT, "SEARCHING...\r41 52 26\r>", vec![0x26])]
    fn parses_mode01_replies(#[case] pid: u8, #[case] reply: &str, #[case] want: Vec<u8>) {
        assert_eq!(parse_response(pid, reply).unwrap(), want);
    }

    #[test]
    fn no_data_is_a_typed_error() {
        let err = parse_response(PID_VEHICLE_SPEED, "NO DATA\r\r>").unwrap_err();
        assert!(matches!(err, HwError::NoData { pid: 0x0D }));
    }

    #[rstest]
    #[case("41 0D 3\r>")]
    #[case("41 0D ZZ\r>")]
    #[case("?\r>")]
    #[case("41 0C 1A F8\r>")]
    fn garbage_is_malformed(#[case] reply: &str) {
        let err = parse_response(PID_VEHICLE_SPEED, reply).unwrap_err();
        assert!(matches!(err, HwError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn decoders_follow_sae_formulas() {
        assert_eq!(decode_speed(&[0x3C]).unwrap(), 60);
        assert_eq!(decode_rpm(&[0x1A, 0xF8]).unwrap(), 1726);
        assert_eq!(decode_ethanol_percent(&[0xFF]).unwrap(), 100);
        assert_eq!(decode_ethanol_percent(&[0x26]).unwrap(), 14);
        assert!(decode_rpm(&[0x1A]).is_err());
    }

    #[test]
    fn gateway_reads_all_three_sensors() {
        let adapter = ScriptedAdapter::new(&["41 0D 50\r>", "41 0C 0B B8\r>", "41 52 19\r>"]);
        let mut gw = ObdGateway::new(IoTransport(adapter)).with_poll_interval(Duration::ZERO);
        let t = Duration::from_millis(50);
        assert_eq!(gw.read_speed(t).unwrap(), 80);
        assert_eq!(gw.read_rpm(t).unwrap(), 750);
        assert_eq!(gw.read_fuel_percent(t).unwrap(), 9);
        assert_eq!(gw.transport.0.written, b"010D\r010C\r0152\r");
    }

    #[test]
    fn gateway_times_out_without_prompt() {
        let adapter = ScriptedAdapter::new(&["41 0D 50"]);
        let mut gw = ObdGateway::new(IoTransport(adapter)).with_poll_interval(Duration::ZERO);
        let err = gw.query(PID_VEHICLE_SPEED, Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, HwError::Timeout));
    }
}
