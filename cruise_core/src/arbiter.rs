//! Merges pedals, serial commands and button holds into one `ControlIntent`.
//!
//! Precedence, highest first: a pressed pedal, a serial line, button holds.
//! With no input the intent is left untouched. Until every sensor reading is
//! known again after a failed poll, the intent stays DISENGAGED and input is
//! ignored. Malformed lines are always reported.

use crate::activation::{ActivationKind, ActivationRequest};
use crate::error::FaultReason;
use crate::serial::parse_line;
use crate::types::{ButtonId, ControlIntent, ControlMode, Pedal, VehicleState};

/// What one arbitration pass decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The intent differs from the one before the pass.
    pub changed: bool,
    /// A set/resume that must pass the throttle-release wait first.
    pub activation: Option<ActivationRequest>,
    pub faults: Vec<FaultReason>,
}

#[derive(Debug, Clone)]
pub struct CommandArbiter {
    intent: ControlIntent,
    adjust_step: i32,
    min_speed: i32,
}

impl CommandArbiter {
    pub fn new(adjust_step: i32, min_speed: i32) -> Self {
        Self {
            intent: ControlIntent::default(),
            adjust_step,
            min_speed,
        }
    }

    pub fn intent(&self) -> ControlIntent {
        self.intent
    }

    /// Drop to DISENGAGED, keeping the target for resume. Returns whether
    /// the mode changed.
    pub fn force_disengage(&mut self) -> bool {
        let was = self.intent.mode;
        self.intent.mode = ControlMode::Disengaged;
        was != ControlMode::Disengaged
    }

    /// Completion of a throttle-release wait.
    pub fn engage_speed_hold(&mut self, target: i32) {
        self.intent = ControlIntent {
            mode: ControlMode::SpeedHold,
            target,
        };
    }

    pub fn resolve(
        &mut self,
        vehicle: &VehicleState,
        line: Option<&str>,
        holds: &[ButtonId],
    ) -> Resolution {
        let before = self.intent;
        let mut out = Resolution::default();

        if let Some(pedal) = vehicle.override_pedal() {
            self.intent.mode = ControlMode::Disengaged;
            if let Some(l) = line {
                tracing::debug!(line = l, %pedal, "serial command ignored during override");
                reject_unparsed(l, &mut out);
            }
            // The throttle-release wait exists for exactly this case.
            if pedal == Pedal::Throttle && !vehicle.sensors_lost() {
                out.activation = self.activation_from(vehicle, holds);
            }
        } else if vehicle.sensors_lost() {
            self.intent.mode = ControlMode::Disengaged;
            if let Some(l) = line {
                tracing::debug!(line = l, "serial command ignored without sensor data");
                reject_unparsed(l, &mut out);
            }
        } else {
            match line.and_then(parse_line) {
                Some(Ok(cmd)) => {
                    self.intent = cmd.apply(self.intent);
                    tracing::debug!(?cmd, "serial command");
                }
                Some(Err(_)) => {
                    self.intent.mode = ControlMode::Disengaged;
                    reject_unparsed(line.unwrap_or_default(), &mut out);
                }
                None => {
                    out.activation = self.activation_from(vehicle, holds);
                    self.apply_adjustments(holds);
                }
            }
        }

        out.changed = self.intent != before;
        out
    }

    fn activation_from(&mut self, vehicle: &VehicleState, holds: &[ButtonId]) -> Option<ActivationRequest> {
        let speed_ok = vehicle.speed.is_some_and(|s| s >= self.min_speed);
        for &id in holds {
            let request = match id {
                ButtonId::A if speed_ok => {
                    let speed = vehicle.speed.unwrap_or_default();
                    self.intent.target = speed;
                    ActivationRequest {
                        kind: ActivationKind::Set,
                        target: speed,
                    }
                }
                ButtonId::C if speed_ok && self.intent.target != 0 => ActivationRequest {
                    kind: ActivationKind::Resume,
                    target: self.intent.target,
                },
                ButtonId::A | ButtonId::C => {
                    tracing::debug!(button = ?id, speed = ?vehicle.speed, target = self.intent.target, "activation refused");
                    continue;
                }
                ButtonId::B | ButtonId::D => continue,
            };
            return Some(request);
        }
        None
    }

    fn apply_adjustments(&mut self, holds: &[ButtonId]) {
        for &id in holds {
            let delta = match id {
                ButtonId::B => self.adjust_step,
                ButtonId::D => -self.adjust_step,
                ButtonId::A | ButtonId::C => continue,
            };
            if self.intent.mode == ControlMode::SpeedHold {
                self.intent.target = self.intent.target.saturating_add(delta);
                tracing::info!(target = self.intent.target, "target adjusted");
            } else {
                tracing::debug!(button = ?id, mode = %self.intent.mode, "adjust ignored outside speed hold");
            }
        }
    }
}

/// Malformed lines are faulted whatever the mode, even when a valid one
/// would be ignored.
fn reject_unparsed(line: &str, out: &mut Resolution) {
    if let Some(Err(e)) = parse_line(line) {
        tracing::warn!(error = %e, "rejected serial command");
        out.faults.push(FaultReason::UnknownCommand(line.trim().to_string()));
    }
}
