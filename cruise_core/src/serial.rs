//! Serial command line protocol.
//!
//! One command per line, `key=value`, case-sensitive:
//!
//! | line | effect |
//! |---|---|
//! | `s=<int>` | speed hold at `<int>` |
//! | `r=<int>` | rpm hold at `<int>` |
//! | `p=<int>` | servo to `<int>` degrees |
//! | `d=<any>` | disengage |
//!
//! Anything else is an unknown command.

use std::io::BufRead;
use std::str::FromStr;
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use cruise_traits::CommandSource;
use thiserror::Error;

use crate::types::{ControlIntent, ControlMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCommand {
    Speed(i32),
    Rpm(i32),
    Position(i32),
    Disengage,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    UnknownKey(String),
    #[error("invalid value in {0:?}")]
    InvalidValue(String),
}

impl FromStr for SerialCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::UnknownKey(line.to_string()));
        };
        let int = || {
            value
                .trim()
                .parse::<i32>()
                .map_err(|_| ParseError::InvalidValue(line.to_string()))
        };
        match key {
            "s" => Ok(Self::Speed(int()?)),
            "r" => Ok(Self::Rpm(int()?)),
            "p" => Ok(Self::Position(int()?)),
            "d" => Ok(Self::Disengage),
            _ => Err(ParseError::UnknownKey(line.to_string())),
        }
    }
}

/// Parse one received line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<SerialCommand, ParseError>> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.parse())
    }
}

impl SerialCommand {
    /// Intent after applying this command. Disengage keeps the target for resume.
    pub fn apply(self, current: ControlIntent) -> ControlIntent {
        match self {
            Self::Speed(v) => ControlIntent {
                mode: ControlMode::SpeedHold,
                target: v,
            },
            Self::Rpm(v) => ControlIntent {
                mode: ControlMode::RpmHold,
                target: v,
            },
            Self::Position(v) => ControlIntent {
                mode: ControlMode::ManualPosition,
                target: v,
            },
            Self::Disengage => ControlIntent {
                mode: ControlMode::Disengaged,
                ..current
            },
        }
    }
}

/// Command source fed by a channel, typically from a reader thread.
pub struct ChannelCommandSource {
    rx: xch::Receiver<String>,
}

impl ChannelCommandSource {
    pub fn new(rx: xch::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Spawn a thread forwarding every line of `reader` into a new source.
    /// The thread exits at end of input or when the source is dropped.
    pub fn spawn_reader<R: BufRead + Send + 'static>(reader: R) -> (Self, JoinHandle<()>) {
        let (tx, rx) = xch::unbounded();
        let handle = std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "serial reader stopped");
                        break;
                    }
                }
            }
            tracing::trace!("serial reader exiting");
        });
        (Self::new(rx), handle)
    }
}

impl CommandSource for ChannelCommandSource {
    fn poll_line(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s=80", SerialCommand::Speed(80))]
    #[case("r=2500", SerialCommand::Rpm(2500))]
    #[case("p=45", SerialCommand::Position(45))]
    #[case("p=-10", SerialCommand::Position(-10))]
    #[case("d=1", SerialCommand::Disengage)]
    #[case("d=", SerialCommand::Disengage)]
    #[case("d=whatever", SerialCommand::Disengage)]
    #[case("  s=65\r", SerialCommand::Speed(65))]
    fn parses_known_commands(#[case] line: &str, #[case] want: SerialCommand) {
        assert_eq!(parse_line(line), Some(Ok(want)));
    }

    #[rstest]
    #[case("x=1")]
    #[case("S=80")]
    #[case("speed=80")]
    #[case("d")]
    #[case("80")]
    fn rejects_unknown_keys(#[case] line: &str) {
        assert!(matches!(parse_line(line), Some(Err(ParseError::UnknownKey(_)))));
    }

    #[rstest]
    #[case("s=abc")]
    #[case("r=")]
    #[case("p=99999999999")]
    #[case("s=1.5")]
    fn rejects_bad_values(#[case] line: &str) {
        assert!(matches!(parse_line(line), Some(Err(ParseError::InvalidValue(_)))));
    }

    #[test]
    fn blank_lines_are_not_commands() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(" \r\n"), None);
    }

    #[test]
    fn disengage_keeps_target() {
        let cur = ControlIntent {
            mode: ControlMode::SpeedHold,
            target: 72,
        };
        let next = SerialCommand::Disengage.apply(cur);
        assert_eq!(next.mode, ControlMode::Disengaged);
        assert_eq!(next.target, 72);
    }

    #[test]
    fn reader_thread_forwards_lines() {
        let input = std::io::Cursor::new(b"s=80\nd=0\n".to_vec());
        let (mut src, handle) = ChannelCommandSource::spawn_reader(input);
        handle.join().unwrap();
        assert_eq!(src.poll_line().as_deref(), Some("s=80"));
        assert_eq!(src.poll_line().as_deref(), Some("d=0"));
        assert_eq!(src.poll_line(), None);
    }
}
