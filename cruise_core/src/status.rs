//! Read-only views produced by the supervisor tick.

use crate::actuation::ActuatorState;
use crate::error::FaultReason;
use crate::types::{ControlIntent, ControlMode, VehicleState};

/// Point-in-time view for status reporting. Building one mutates nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime_ms: u64,
    pub mode: ControlMode,
    pub target: i32,
    pub vehicle: VehicleState,
    pub actuator: ActuatorState,
    /// A set/resume is waiting for the throttle.
    pub activation_pending: bool,
}

/// Result of one supervisor tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub intent: ControlIntent,
    /// Faults raised during this tick, in the order they occurred.
    pub faults: Vec<FaultReason>,
    /// Present when the status task was due.
    pub status: Option<StatusSnapshot>,
    /// The actuation engine was evaluated this tick.
    pub actuated: bool,
}
