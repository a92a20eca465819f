//! Human-readable error descriptions and structured JSON error formatting.

use crate::supervise::fault_reason_name;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use cruise_core::error::{BuildError, CruiseError, FaultReason};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensors => {
                "What happened: No vehicle sensors were provided to the supervisor.\nLikely causes: The diagnostics adapter failed to open or was not wired into the builder.\nHow to fix: Check the [obd] port and baud, then pass the gateway via with_sensors(...).".to_string()
            }
            BuildError::MissingActuator => {
                "What happened: No throttle actuator was provided to the supervisor.\nLikely causes: The servo pin failed to initialize or was not wired into the builder.\nHow to fix: Check pins.servo and pass the servo via with_actuator(...).".to_string()
            }
            BuildError::MissingInputs => {
                "What happened: No input pins were provided to the supervisor.\nLikely causes: GPIO setup failed or the inputs were not wired into the builder.\nHow to fix: Check the button and pedal entries in [pins] and pass them via with_inputs(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CruiseError>() {
        return match ce {
            CruiseError::Timeout => "What happened: Sensor read timed out.\nLikely causes: Diagnostics adapter unpowered, wrong serial port, or timeout too low.\nHow to fix: Verify the [obd] port and wiring, and consider raising timeouts.sensor_ms.".to_string(),
            CruiseError::Fault(FaultReason::SensorRead { sensor, detail }) => format!(
                "What happened: Reading {sensor} failed ({detail}).\nLikely causes: Adapter not connected, ignition off, or the vehicle does not report this value.\nHow to fix: Check the OBD connection and ignition, then run self-check again."
            ),
            CruiseError::Fault(FaultReason::SafetyOverride(pedal)) => format!(
                "What happened: The {pedal} pedal is pressed.\nLikely causes: Driver input or a pedal switch stuck closed.\nHow to fix: Release the pedal and check the switch wiring."
            ),
            CruiseError::Fault(FaultReason::ActivationTimeout(ms)) => format!(
                "What happened: Throttle was not released within {ms} ms, so activation was cancelled.\nLikely causes: Throttle held after set/resume or a stuck throttle switch.\nHow to fix: Release the throttle after the cue, or raise activation.throttle_release_timeout_ms."
            ),
            CruiseError::Fault(FaultReason::UnknownCommand(line)) => format!(
                "What happened: Unrecognised serial command {line:?}.\nLikely causes: Typo or unsupported key.\nHow to fix: Send one of s=<speed>, r=<rpm>, p=<degrees> or d=."
            ),
            CruiseError::Hardware(_) | CruiseError::HardwareFault(_) => format!(
                "What happened: {ce}.\nLikely causes: Wiring, power or permission problem on the device.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if err.downcast_ref::<toml::de::Error>().is_some() {
        return format!(
            "What happened: The config file is not valid TOML.\nLikely causes: Syntax error or a value of the wrong type.\nHow to fix: Fix the file and rerun. Parser said: {err}"
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open input pins")
        || lower.contains("open servo pin")
        || lower.contains("open buzzer pin")
    {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("open obd adapter") {
        return "What happened: Failed to open the diagnostics adapter.\nLikely causes: Wrong serial device, adapter unplugged, or UART disabled.\nHow to fix: Check obd.port and obd.baud in the config and that the UART is enabled.".to_string();
    }

    if lower.contains("invalid configuration")
        || lower.contains("read config")
        || (lower.contains("pins") && lower.contains("missing"))
    {
        return format!(
            "What happened: Configuration is invalid or incomplete ({msg}).\nLikely causes: Missing [pins] (button_a..button_d, button_any, brake, throttle, servo), or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map faults (if present) to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use cruise_core::error::{CruiseError, FaultReason};
    match err.downcast_ref::<CruiseError>() {
        Some(CruiseError::Fault(reason)) => match reason {
            FaultReason::SafetyOverride(_) => 2,
            FaultReason::SensorRead { .. } => 3,
            FaultReason::ActivationTimeout(_) => 4,
            FaultReason::UnknownCommand(_) => 5,
        },
        Some(CruiseError::Timeout) => 3,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use cruise_core::error::{CruiseError, FaultReason};
    use serde_json::json;

    if let Some(CruiseError::Fault(reason)) = err.downcast_ref::<CruiseError>() {
        let msg = humanize(err);
        let details = match reason {
            FaultReason::SensorRead { sensor, detail } => {
                json!({ "sensor": sensor.to_string(), "detail": detail })
            }
            FaultReason::ActivationTimeout(ms) => json!({ "timeout_ms": ms }),
            FaultReason::SafetyOverride(pedal) => json!({ "pedal": pedal.to_string() }),
            FaultReason::UnknownCommand(line) => json!({ "line": line }),
        };
        return json!({ "reason": fault_reason_name(reason), "details": details, "message": msg })
            .to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
