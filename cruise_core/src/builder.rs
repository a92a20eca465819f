//! Type-state builder for `Supervisor`.
//!
//! Sensors, actuator and input pins must be provided before `build()` is
//! available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use cruise_traits::clock::{Clock, MonotonicClock};
use cruise_traits::{Actuator, Annunciator, CommandSource, InputPins, VehicleSensors};

use crate::actuation::ActuationEngine;
use crate::arbiter::CommandArbiter;
use crate::config::{ActivationCfg, ActuatorCfg, ButtonCfg, ScheduleCfg, Timeouts};
use crate::debounce::InputDebouncer;
use crate::error::{BuildError, Result};
use crate::mocks::{NoCommands, SilentAnnunciator};
use crate::scheduler::Schedule;
use crate::supervisor::Supervisor;
use crate::types::VehicleState;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Supervisor`. All configuration is validated on `build()`.
pub struct SupervisorBuilder<S, A, I> {
    sensors: Option<Box<dyn VehicleSensors>>,
    actuator: Option<Box<dyn Actuator>>,
    inputs: Option<Box<dyn InputPins>>,
    commands: Option<Box<dyn CommandSource>>,
    annunciator: Option<Box<dyn Annunciator>>,
    buttons: Option<ButtonCfg>,
    schedule: Option<ScheduleCfg>,
    actuator_cfg: Option<ActuatorCfg>,
    activation: Option<ActivationCfg>,
    timeouts: Option<Timeouts>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _a: PhantomData<A>,
    _i: PhantomData<I>,
}

impl Default for SupervisorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: None,
            actuator: None,
            inputs: None,
            commands: None,
            annunciator: None,
            buttons: None,
            schedule: None,
            actuator_cfg: None,
            activation: None,
            timeouts: None,
            clock: None,
            _s: PhantomData,
            _a: PhantomData,
            _i: PhantomData,
        }
    }
}

impl Supervisor {
    /// Start building a Supervisor.
    pub fn builder() -> SupervisorBuilder<Missing, Missing, Missing> {
        SupervisorBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(
    buttons: &ButtonCfg,
    schedule: &ScheduleCfg,
    actuator: &ActuatorCfg,
    activation: &ActivationCfg,
    timeouts: &Timeouts,
) -> Result<()> {
    if buttons.activate_hold_ms == 0 || buttons.adjust_hold_ms == 0 {
        return Err(invalid("hold thresholds must be > 0"));
    }
    if buttons.adjust_step <= 0 {
        return Err(invalid("adjust_step must be > 0"));
    }
    if buttons.press_debounce_n == 0 {
        return Err(invalid("press_debounce_n must be >= 1"));
    }
    if [
        schedule.pedal_poll_ms,
        schedule.sensor_poll_ms,
        schedule.evaluate_ms,
        schedule.status_ms,
        schedule.loop_ms,
    ]
    .contains(&0)
    {
        return Err(invalid("schedule periods must be > 0"));
    }
    if actuator.min_deg >= actuator.max_deg {
        return Err(invalid("actuator min_deg must be < max_deg"));
    }
    if !(actuator.min_deg..=actuator.max_deg).contains(&actuator.neutral_deg) {
        return Err(invalid("actuator neutral_deg must lie within [min_deg, max_deg]"));
    }
    if activation.throttle_release_timeout_ms == 0 {
        return Err(invalid("throttle_release_timeout_ms must be > 0"));
    }
    if activation.min_speed < 0 {
        return Err(invalid("min_speed must be >= 0"));
    }
    if timeouts.sensor_ms == 0 {
        return Err(invalid("sensor_ms must be >= 1"));
    }
    Ok(())
}

impl<S, A, I> SupervisorBuilder<S, A, I> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Supervisor> {
        let sensors = self
            .sensors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensors))?;
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let pins = self
            .inputs
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInputs))?;

        let buttons = self.buttons.unwrap_or_default();
        let schedule_cfg = self.schedule.unwrap_or_default();
        let actuator_cfg = self.actuator_cfg.unwrap_or_default();
        let activation = self.activation.unwrap_or_default();
        let timeouts = self.timeouts.unwrap_or_default();
        validate(&buttons, &schedule_cfg, &actuator_cfg, &activation, &timeouts)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(Supervisor {
            sensors,
            pins,
            commands: self.commands.unwrap_or_else(|| Box::new(NoCommands)),
            cues: self
                .annunciator
                .unwrap_or_else(|| Box::new(SilentAnnunciator)),
            engine: ActuationEngine::new(actuator, actuator_cfg),
            debouncer: InputDebouncer::new(buttons.clone()),
            arbiter: CommandArbiter::new(buttons.adjust_step, activation.min_speed),
            vehicle: VehicleState::default(),
            schedule: Schedule::new(&schedule_cfg),
            pending: None,
            clock,
            epoch,
            buttons,
            schedule_cfg,
            activation,
            timeouts,
            override_reported: None,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, A, I> SupervisorBuilder<S, A, I> {
    /// Serial command channel; defaults to one that never yields a line.
    pub fn with_commands(mut self, commands: impl CommandSource + 'static) -> Self {
        self.commands = Some(Box::new(commands));
        self
    }
    /// Audible feedback sink; defaults to silence.
    pub fn with_annunciator(mut self, annunciator: impl Annunciator + 'static) -> Self {
        self.annunciator = Some(Box::new(annunciator));
        self
    }
    pub fn with_buttons(mut self, buttons: ButtonCfg) -> Self {
        self.buttons = Some(buttons);
        self
    }
    pub fn with_schedule(mut self, schedule: ScheduleCfg) -> Self {
        self.schedule = Some(schedule);
        self
    }
    pub fn with_actuator_cfg(mut self, cfg: ActuatorCfg) -> Self {
        self.actuator_cfg = Some(cfg);
        self
    }
    pub fn with_activation(mut self, activation: ActivationCfg) -> Self {
        self.activation = Some(activation);
        self
    }
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Apply every section of a loaded config file.
    pub fn with_config(self, cfg: &cruise_config::Config) -> Self {
        self.with_buttons(ButtonCfg::from(&cfg.buttons))
            .with_schedule(ScheduleCfg::from(&cfg.schedule))
            .with_actuator_cfg(ActuatorCfg::from(&cfg.actuator))
            .with_activation(ActivationCfg::from(&cfg.activation))
            .with_timeouts(Timeouts::from(&cfg.timeouts))
    }
}

// Setters that advance type-state
impl<A, I> SupervisorBuilder<Missing, A, I> {
    pub fn with_sensors(
        self,
        sensors: impl VehicleSensors + 'static,
    ) -> SupervisorBuilder<Set, A, I> {
        SupervisorBuilder {
            sensors: Some(Box::new(sensors)),
            actuator: self.actuator,
            inputs: self.inputs,
            commands: self.commands,
            annunciator: self.annunciator,
            buttons: self.buttons,
            schedule: self.schedule,
            actuator_cfg: self.actuator_cfg,
            activation: self.activation,
            timeouts: self.timeouts,
            clock: self.clock,
            _s: PhantomData,
            _a: PhantomData,
            _i: PhantomData,
        }
    }
}

impl<S, I> SupervisorBuilder<S, Missing, I> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> SupervisorBuilder<S, Set, I> {
        SupervisorBuilder {
            sensors: self.sensors,
            actuator: Some(Box::new(actuator)),
            inputs: self.inputs,
            commands: self.commands,
            annunciator: self.annunciator,
            buttons: self.buttons,
            schedule: self.schedule,
            actuator_cfg: self.actuator_cfg,
            activation: self.activation,
            timeouts: self.timeouts,
            clock: self.clock,
            _s: PhantomData,
            _a: PhantomData,
            _i: PhantomData,
        }
    }
}

impl<S, A> SupervisorBuilder<S, A, Missing> {
    pub fn with_inputs(self, inputs: impl InputPins + 'static) -> SupervisorBuilder<S, A, Set> {
        SupervisorBuilder {
            sensors: self.sensors,
            actuator: self.actuator,
            inputs: Some(Box::new(inputs)),
            commands: self.commands,
            annunciator: self.annunciator,
            buttons: self.buttons,
            schedule: self.schedule,
            actuator_cfg: self.actuator_cfg,
            activation: self.activation,
            timeouts: self.timeouts,
            clock: self.clock,
            _s: PhantomData,
            _a: PhantomData,
            _i: PhantomData,
        }
    }
}

impl SupervisorBuilder<Set, Set, Set> {
    /// Validate and build. Only available when sensors, actuator and inputs are set.
    pub fn build(self) -> Result<Supervisor> {
        self.try_build()
    }
}
