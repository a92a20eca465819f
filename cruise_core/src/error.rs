use thiserror::Error;

use crate::types::{Pedal, Sensor};

/// Conditions that force DISENGAGED. None of them stop the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FaultReason {
    #[error("safety override: {0} pedal pressed")]
    SafetyOverride(Pedal),
    #[error("{sensor} read failed: {detail}")]
    SensorRead { sensor: Sensor, detail: String },
    #[error("throttle not released within {0} ms, activation cancelled")]
    ActivationTimeout(u64),
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

#[derive(Debug, Error, Clone)]
pub enum CruiseError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("fault: {0}")]
    Fault(FaultReason),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing vehicle sensors")]
    MissingSensors,
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing input pins")]
    MissingInputs,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
