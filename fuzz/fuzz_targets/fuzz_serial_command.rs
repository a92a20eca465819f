#![no_main]
use cruise_core::{ControlIntent, ControlMode, SerialCommand, parse_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any line either parses or is rejected without panicking.
    if let Some(Ok(cmd)) = parse_line(data) {
        let before = ControlIntent {
            mode: ControlMode::SpeedHold,
            target: 42,
        };
        let after = cmd.apply(before);
        if cmd == SerialCommand::Disengage {
            assert_eq!(after.target, before.target);
            assert_eq!(after.mode, ControlMode::Disengaged);
        }
    }
});
