//! The supervisory control loop: one non-preemptive tick drives every
//! component in a fixed order.
//!
//! Per tick:
//! 1. a pending throttle-release wait, if any, is serviced and nothing else
//!    runs; a held throttle keeps the actuator released while it waits;
//! 2. pedals (periodic): a pressed pedal disengages and actuates immediately;
//! 3. sensors (periodic): any failed read disengages and actuates immediately;
//! 4. one serial line and the button holds go through the arbiter;
//! 5. actuation, when due or when the intent changed;
//! 6. a status snapshot, when due.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cruise_traits::{
    Actuator, Annunciator, Clock, CommandSource, Cue, InputLine, InputPins, VehicleSensors,
};
use eyre::WrapErr;

use crate::activation::{PendingActivation, WaitOutcome};
use crate::actuation::{ActuationEngine, ActuatorState};
use crate::arbiter::CommandArbiter;
use crate::config::{ActivationCfg, ButtonCfg, ScheduleCfg, Timeouts};
use crate::debounce::InputDebouncer;
use crate::error::{CruiseError, FaultReason, Result};
use crate::hw_error::map_hw_error;
use crate::scheduler::Schedule;
use crate::status::{StatusSnapshot, TickReport};
use crate::types::{ControlIntent, Pedal, PedalState, Sensor, VehicleState};

pub struct Supervisor {
    pub(crate) sensors: Box<dyn VehicleSensors>,
    pub(crate) pins: Box<dyn InputPins>,
    pub(crate) commands: Box<dyn CommandSource>,
    pub(crate) cues: Box<dyn Annunciator>,
    pub(crate) engine: ActuationEngine<Box<dyn Actuator>>,
    pub(crate) debouncer: InputDebouncer,
    pub(crate) arbiter: CommandArbiter,
    pub(crate) vehicle: VehicleState,
    pub(crate) schedule: Schedule,
    pub(crate) pending: Option<PendingActivation>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) buttons: ButtonCfg,
    pub(crate) schedule_cfg: ScheduleCfg,
    pub(crate) activation: ActivationCfg,
    pub(crate) timeouts: Timeouts,
    /// Pedal whose override was last reported.
    pub(crate) override_reported: Option<Pedal>,
}

impl core::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Supervisor")
            .field("intent", &self.arbiter.intent())
            .field("vehicle", &self.vehicle)
            .field("engine", &self.engine)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Park the actuator and arm every periodic task.
    pub fn begin(&mut self) -> Result<()> {
        self.engine.begin().wrap_err("parking actuator")?;
        self.debouncer.reset();
        self.pending = None;
        self.override_reported = None;
        let now = self.uptime_ms();
        self.schedule.reset(now);
        tracing::info!(
            pedal_poll_ms = self.schedule_cfg.pedal_poll_ms,
            sensor_poll_ms = self.schedule_cfg.sensor_poll_ms,
            evaluate_ms = self.schedule_cfg.evaluate_ms,
            "supervisor started"
        );
        Ok(())
    }

    /// Run one loop iteration.
    ///
    /// Faults never fail the tick; they disengage and are listed in the
    /// report. An `Err` means the actuator itself could not be driven.
    pub fn tick(&mut self) -> Result<TickReport> {
        let now = self.uptime_ms();
        let mut faults = Vec::new();

        if self.pending.is_some() {
            let outcome = self.service_wait(now, &mut faults)?;
            return Ok(TickReport {
                intent: self.arbiter.intent(),
                faults,
                status: None,
                actuated: outcome != WaitOutcome::Pending || self.vehicle.throttle.is_pressed(),
            });
        }

        let mut apply_now = false;

        if self.schedule.pedals.due(now) {
            self.read_pedals();
            self.report_override(&mut faults);
            if self.vehicle.override_pedal().is_some() {
                self.arbiter.force_disengage();
                apply_now = true;
            }
        }

        if self.schedule.sensors.due(now) && !self.read_sensors(&mut faults) {
            self.arbiter.force_disengage();
            apply_now = true;
        }

        let line = self.commands.poll_line();
        let holds = self.debouncer.poll(&mut *self.pins, now);
        let resolution = self.arbiter.resolve(&self.vehicle, line.as_deref(), &holds);
        faults.extend(resolution.faults);

        if let Some(request) = resolution.activation {
            tracing::info!(
                kind = ?request.kind,
                target = request.target,
                timeout_ms = self.activation.throttle_release_timeout_ms,
                "waiting for throttle release"
            );
            self.pending = Some(PendingActivation::start(
                request,
                now,
                self.activation.throttle_release_timeout_ms,
            ));
            let outcome = self.service_wait(now, &mut faults)?;
            if outcome == WaitOutcome::Pending {
                // A held throttle already released the actuator inside the wait.
                let held = self.vehicle.throttle.is_pressed();
                if apply_now && !held {
                    self.evaluate()?;
                }
                return Ok(TickReport {
                    intent: self.arbiter.intent(),
                    faults,
                    status: None,
                    actuated: apply_now || held,
                });
            }
            // The wait already actuated; count it as this tick's evaluation.
            self.schedule.evaluate.due(now);
            return Ok(TickReport {
                intent: self.arbiter.intent(),
                faults,
                status: self.status_if_due(now),
                actuated: true,
            });
        }

        let evaluate_due = self.schedule.evaluate.due(now);
        let actuated = apply_now || resolution.changed || evaluate_due;
        if actuated {
            self.evaluate()?;
        }

        Ok(TickReport {
            intent: self.arbiter.intent(),
            faults,
            status: self.status_if_due(now),
            actuated,
        })
    }

    fn service_wait(&mut self, now: u64, faults: &mut Vec<FaultReason>) -> Result<WaitOutcome> {
        let Some(pending) = self.pending else {
            return Ok(WaitOutcome::Released);
        };
        self.read_pedals();
        let outcome = pending.poll(self.vehicle.brake, self.vehicle.throttle, now);
        match outcome {
            WaitOutcome::Pending => {
                // The throttle is an override even while the wait expects it.
                if self.vehicle.throttle.is_pressed() {
                    self.report_override(faults);
                    self.arbiter.force_disengage();
                    self.evaluate()?;
                }
                return Ok(outcome);
            }
            WaitOutcome::Released => {
                tracing::info!(
                    target = pending.request.target,
                    waited_ms = pending.waited_ms(now),
                    "throttle released, holding speed"
                );
                self.report_override(faults);
                self.arbiter.engage_speed_hold(pending.request.target);
                self.cues.announce(Cue::ActivationConfirmed);
            }
            WaitOutcome::TimedOut => {
                let fault = FaultReason::ActivationTimeout(self.activation.throttle_release_timeout_ms);
                tracing::warn!(%fault, "activation cancelled");
                faults.push(fault);
                self.arbiter.force_disengage();
            }
            WaitOutcome::Cancelled(_) => {
                tracing::warn!("activation cancelled by brake");
                self.report_override(faults);
                self.arbiter.force_disengage();
            }
        }
        self.pending = None;
        self.evaluate()?;
        Ok(outcome)
    }

    fn evaluate(&mut self) -> Result<()> {
        self.engine.apply(self.arbiter.intent(), &mut *self.cues)
    }

    fn read_pedals(&mut self) {
        self.vehicle.brake = PedalState::from_level(self.pins.is_high(InputLine::Brake));
        self.vehicle.throttle = PedalState::from_level(self.pins.is_high(InputLine::Throttle));
        tracing::trace!(brake = ?self.vehicle.brake, throttle = ?self.vehicle.throttle, "pedals");
    }

    /// Report the override once per pedal episode.
    fn report_override(&mut self, faults: &mut Vec<FaultReason>) {
        let pedal = self.vehicle.override_pedal();
        if pedal == self.override_reported {
            return;
        }
        match pedal {
            Some(p) => {
                let fault = FaultReason::SafetyOverride(p);
                tracing::warn!(%fault, "driver override");
                faults.push(fault);
            }
            None => tracing::info!("pedals released"),
        }
        self.override_reported = pedal;
    }

    /// Refresh all three readings. Returns `false` if any read failed.
    fn read_sensors(&mut self, faults: &mut Vec<FaultReason>) -> bool {
        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let speed = self.sensors.read_speed(timeout);
        let rpm = self.sensors.read_rpm(timeout);
        let fuel = self.sensors.read_fuel_percent(timeout);

        let mut ok = true;
        for (sensor, reading, slot) in [
            (Sensor::Speed, speed, &mut self.vehicle.speed),
            (Sensor::Rpm, rpm, &mut self.vehicle.rpm),
            (Sensor::Fuel, fuel, &mut self.vehicle.fuel_percent),
        ] {
            match reading {
                Ok(v) => *slot = Some(v),
                Err(e) => {
                    *slot = None;
                    ok = false;
                    let fault = FaultReason::SensorRead {
                        sensor,
                        detail: map_hw_error(&*e).to_string(),
                    };
                    tracing::warn!(%fault, "sensor fault");
                    faults.push(fault);
                }
            }
        }
        tracing::trace!(speed = ?self.vehicle.speed, rpm = ?self.vehicle.rpm, fuel = ?self.vehicle.fuel_percent, "sensors");
        ok
    }

    fn status_if_due(&mut self, now: u64) -> Option<StatusSnapshot> {
        self.schedule.status.due(now).then(|| self.snapshot())
    }

    /// Read every sensor and pedal once without touching the actuator.
    pub fn self_check(&mut self) -> Result<VehicleState> {
        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let mut state = VehicleState::default();
        for sensor in [Sensor::Speed, Sensor::Rpm, Sensor::Fuel] {
            let reading = match sensor {
                Sensor::Speed => self.sensors.read_speed(timeout),
                Sensor::Rpm => self.sensors.read_rpm(timeout),
                Sensor::Fuel => self.sensors.read_fuel_percent(timeout),
            };
            let value = reading.map_err(|e| {
                eyre::Report::new(CruiseError::Fault(FaultReason::SensorRead {
                    sensor,
                    detail: map_hw_error(&*e).to_string(),
                }))
            })?;
            match sensor {
                Sensor::Speed => state.speed = Some(value),
                Sensor::Rpm => state.rpm = Some(value),
                Sensor::Fuel => state.fuel_percent = Some(value),
            }
        }
        state.brake = PedalState::from_level(self.pins.is_high(InputLine::Brake));
        state.throttle = PedalState::from_level(self.pins.is_high(InputLine::Throttle));
        Ok(state)
    }

    /// Disengage now, propagating actuator errors.
    pub fn disengage_now(&mut self) -> Result<()> {
        self.pending = None;
        self.arbiter.force_disengage();
        self.evaluate()
    }

    /// Best-effort release of the actuator, e.g. after a failed tick or on exit.
    pub fn recover(&mut self) {
        self.pending = None;
        self.arbiter.force_disengage();
        self.engine.force_safe(&mut *self.cues);
    }

    /// Sleep for one loop period on the supervisor's clock.
    pub fn idle(&self) {
        self.clock
            .sleep(Duration::from_millis(self.schedule_cfg.loop_ms));
    }

    pub fn uptime_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let intent = self.arbiter.intent();
        StatusSnapshot {
            uptime_ms: self.uptime_ms(),
            mode: intent.mode,
            target: intent.target,
            vehicle: self.vehicle,
            actuator: self.engine.state(),
            activation_pending: self.pending.is_some(),
        }
    }

    pub fn intent(&self) -> ControlIntent {
        self.arbiter.intent()
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn actuator_state(&self) -> ActuatorState {
        self.engine.state()
    }

    pub fn activation_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn button_cfg(&self) -> &ButtonCfg {
        &self.buttons
    }

    pub fn schedule_cfg(&self) -> &ScheduleCfg {
        &self.schedule_cfg
    }
}
