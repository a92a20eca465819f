//! Actuation engine: turns the current intent into servo side effects.

use cruise_traits::{Actuator, Annunciator, Cue};
use eyre::WrapErr;

use crate::config::ActuatorCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::types::{ControlIntent, ControlMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub engaged: bool,
    /// Last commanded position in degrees.
    pub position: i32,
}

pub struct ActuationEngine<A: Actuator> {
    actuator: A,
    cfg: ActuatorCfg,
    state: ActuatorState,
    mode: ControlMode,
    /// Disengage cue already emitted for the current episode.
    disengage_announced: bool,
}

impl<A: Actuator> core::fmt::Debug for ActuationEngine<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuationEngine")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("disengage_announced", &self.disengage_announced)
            .finish_non_exhaustive()
    }
}

impl<A: Actuator> ActuationEngine<A> {
    pub fn new(actuator: A, cfg: ActuatorCfg) -> Self {
        let neutral = cfg.neutral_deg;
        Self {
            actuator,
            cfg,
            state: ActuatorState {
                engaged: false,
                position: neutral,
            },
            mode: ControlMode::Disengaged,
            // Power-on is not a disengage episode.
            disengage_announced: true,
        }
    }

    /// Park the servo at neutral and release it. Silent.
    pub fn begin(&mut self) -> Result<()> {
        self.write(self.cfg.neutral_deg)?;
        self.detach()?;
        self.mode = ControlMode::Disengaged;
        Ok(())
    }

    /// Apply one evaluation. Idempotent for an unchanged intent.
    pub fn apply(&mut self, intent: ControlIntent, cues: &mut dyn Annunciator) -> Result<()> {
        match intent.mode {
            ControlMode::Disengaged => self.disengage(cues),
            ControlMode::SpeedHold | ControlMode::RpmHold | ControlMode::ManualPosition => {
                self.engage(intent)
            }
        }
    }

    fn engage(&mut self, intent: ControlIntent) -> Result<()> {
        let position = self.cfg.commanded_position(intent.target);
        if position != intent.target {
            tracing::debug!(target = intent.target, position, "commanded position clamped");
        }
        if self.mode != intent.mode {
            tracing::info!(mode = %intent.mode, target = intent.target, "engaged");
        }
        self.mode = intent.mode;
        self.disengage_announced = false;
        if !self.state.engaged || self.state.position != position {
            self.write(position)?;
        }
        if !self.state.engaged {
            self.actuator
                .attach()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("servo attach")?;
            self.state.engaged = true;
        }
        Ok(())
    }

    fn disengage(&mut self, cues: &mut dyn Annunciator) -> Result<()> {
        if self.mode != ControlMode::Disengaged {
            tracing::info!(from = %self.mode, "disengaged");
        }
        self.mode = ControlMode::Disengaged;
        if !self.disengage_announced {
            self.disengage_announced = true;
            cues.announce(Cue::Disengaged);
        }
        if self.state.engaged || self.state.position != self.cfg.neutral_deg {
            // Detach even when the neutral write fails.
            let wrote = self.write(self.cfg.neutral_deg);
            let detached = self.detach();
            wrote.and(detached)?;
        }
        Ok(())
    }

    /// Best-effort release after an error elsewhere. Never fails.
    pub fn force_safe(&mut self, cues: &mut dyn Annunciator) {
        self.mode = ControlMode::Disengaged;
        if !self.disengage_announced {
            self.disengage_announced = true;
            cues.announce(Cue::Disengaged);
        }
        if let Err(e) = self.write(self.cfg.neutral_deg) {
            tracing::warn!(error = %e, "neutral write failed during forced release");
        }
        if let Err(e) = self.detach() {
            tracing::warn!(error = %e, "detach failed during forced release");
        }
    }

    fn write(&mut self, degrees: i32) -> Result<()> {
        self.actuator
            .write_position(degrees)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("servo write")?;
        self.state.position = degrees;
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.actuator
            .detach()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("servo detach")?;
        self.state.engaged = false;
        Ok(())
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cruise_hardware::{ServoTrace, SimulatedBuzzer, SimulatedServo};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> (ActuationEngine<SimulatedServo>, Rc<RefCell<ServoTrace>>) {
        let servo = SimulatedServo::new();
        let trace = servo.trace();
        let mut e = ActuationEngine::new(servo, ActuatorCfg::default());
        e.begin().unwrap();
        (e, trace)
    }

    fn intent(mode: ControlMode, target: i32) -> ControlIntent {
        ControlIntent { mode, target }
    }

    #[test]
    fn boot_is_silent_and_parked() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        e.apply(intent(ControlMode::Disengaged, 0), &mut buzzer).unwrap();
        assert!(buzzer.cues().borrow().is_empty());
        let t = servo.borrow();
        assert!(!t.attached);
        assert_eq!(t.position, 0);
    }

    #[test]
    fn engage_writes_before_attach() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        e.apply(intent(ControlMode::SpeedHold, 60), &mut buzzer).unwrap();
        let t = servo.borrow();
        assert!(t.attached);
        assert_eq!(t.position, 60);
        assert_eq!(t.attach_count, 1);
        assert_eq!(t.writes.last(), Some(&60));
        assert!(e.state().engaged);
    }

    #[test]
    fn one_cue_per_disengage_episode() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        e.apply(intent(ControlMode::ManualPosition, 90), &mut buzzer).unwrap();
        for _ in 0..5 {
            e.apply(intent(ControlMode::Disengaged, 90), &mut buzzer).unwrap();
        }
        assert_eq!(*buzzer.cues().borrow(), vec![Cue::Disengaged]);
        assert_eq!(servo.borrow().detach_count, 2);

        e.apply(intent(ControlMode::RpmHold, 30), &mut buzzer).unwrap();
        e.apply(intent(ControlMode::Disengaged, 30), &mut buzzer).unwrap();
        assert_eq!(buzzer.cues().borrow().len(), 2);
    }

    #[test]
    fn positions_are_clamped() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        e.apply(intent(ControlMode::ManualPosition, 400), &mut buzzer).unwrap();
        assert_eq!(servo.borrow().position, 180);
        e.apply(intent(ControlMode::ManualPosition, -20), &mut buzzer).unwrap();
        assert_eq!(servo.borrow().position, 0);
    }

    #[test]
    fn write_failure_surfaces_as_error() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        servo.borrow_mut().fail_writes = true;
        let err = e
            .apply(intent(ControlMode::SpeedHold, 60), &mut buzzer)
            .unwrap_err();
        assert!(err.to_string().contains("servo write"));
        assert!(!e.state().engaged);
        e.force_safe(&mut buzzer);
        assert_eq!(e.mode(), ControlMode::Disengaged);
    }

    #[test]
    fn steady_hold_does_not_rewrite() {
        let (mut e, servo) = engine();
        let mut buzzer = SimulatedBuzzer::default();
        for _ in 0..3 {
            e.apply(intent(ControlMode::SpeedHold, 60), &mut buzzer).unwrap();
        }
        assert_eq!(servo.borrow().writes.iter().filter(|&&w| w == 60).count(), 1);
    }
}
