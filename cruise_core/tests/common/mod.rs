//! Shared test rig: a supervisor wired to simulated devices and a hand-driven clock.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cruise_core::mocks::QueuedCommands;
use cruise_core::{ButtonId, ControlMode, FaultReason, Supervisor, TickReport};
use cruise_hardware::{
    ServoTrace, SimInputsHandle, SimVehicleHandle, SimulatedBuzzer, SimulatedInputs,
    SimulatedServo, SimulatedVehicle,
};
use cruise_traits::clock::test_clock::TestClock;
use cruise_traits::{Cue, InputLine};

pub const LOOP_MS: u64 = 10;

pub struct Rig {
    pub sup: Supervisor,
    pub clock: TestClock,
    pub vehicle: SimVehicleHandle,
    pub inputs: SimInputsHandle,
    pub servo: Rc<RefCell<ServoTrace>>,
    pub cues: Rc<RefCell<Vec<Cue>>>,
    pub commands: Rc<RefCell<std::collections::VecDeque<String>>>,
}

impl Rig {
    pub fn new(speed: i32) -> Self {
        Self::with(speed, |b| b)
    }

    /// Build with extra builder tweaks applied before `build()`.
    pub fn with<F>(speed: i32, tweak: F) -> Self
    where
        F: FnOnce(
            cruise_core::SupervisorBuilder<cruise_core::Set, cruise_core::Set, cruise_core::Set>,
        ) -> cruise_core::SupervisorBuilder<
            cruise_core::Set,
            cruise_core::Set,
            cruise_core::Set,
        >,
    {
        let clock = TestClock::new();
        let vehicle = SimulatedVehicle::new(speed, 1800, 10);
        let inputs = SimulatedInputs::new();
        let servo = SimulatedServo::new();
        let buzzer = SimulatedBuzzer::new();
        let commands = QueuedCommands::new();

        let rig_vehicle = vehicle.handle();
        let rig_inputs = inputs.handle();
        let rig_servo = servo.trace();
        let rig_cues = buzzer.cues();
        let rig_commands = commands.handle();

        let builder = Supervisor::builder()
            .with_sensors(vehicle)
            .with_actuator(servo)
            .with_inputs(inputs)
            .with_commands(commands)
            .with_annunciator(buzzer)
            .with_clock(Box::new(clock.clone()));
        let mut sup = tweak(builder).build().unwrap();
        sup.begin().unwrap();

        Self {
            sup,
            clock,
            vehicle: rig_vehicle,
            inputs: rig_inputs,
            servo: rig_servo,
            cues: rig_cues,
            commands: rig_commands,
        }
    }

    /// Tick once.
    pub fn tick(&mut self) -> TickReport {
        let r = self.sup.tick().unwrap();
        self.clock.advance_ms(LOOP_MS);
        r
    }

    /// Tick every loop period for `ms` milliseconds.
    pub fn step(&mut self, ms: u64) -> Vec<TickReport> {
        (0..ms / LOOP_MS).map(|_| self.tick()).collect()
    }

    /// Faults raised over `ms` milliseconds.
    pub fn step_faults(&mut self, ms: u64) -> Vec<FaultReason> {
        self.step(ms).into_iter().flat_map(|r| r.faults).collect()
    }

    pub fn press(&self, id: ButtonId) {
        self.inputs.set_low(id.line());
        self.inputs.set_low(InputLine::AnyButton);
    }

    pub fn release(&self, id: ButtonId) {
        self.inputs.set_high(id.line());
        self.inputs.set_high(InputLine::AnyButton);
    }

    pub fn send(&self, line: &str) {
        self.commands.borrow_mut().push_back(line.to_string());
    }

    pub fn mode(&self) -> ControlMode {
        self.sup.intent().mode
    }

    pub fn target(&self) -> i32 {
        self.sup.intent().target
    }

    pub fn cue_count(&self, cue: Cue) -> usize {
        self.cues.borrow().iter().filter(|&&c| c == cue).count()
    }

    /// Hold a button long enough for its threshold, then release it.
    pub fn hold(&mut self, id: ButtonId, ms: u64) {
        self.press(id);
        self.step(ms);
        self.release(id);
        self.step(LOOP_MS);
    }

    /// Engage speed hold at `target` through the serial channel.
    pub fn engage(&mut self, target: i32) {
        self.send(&format!("s={target}"));
        self.step(LOOP_MS);
        assert_eq!(self.mode(), ControlMode::SpeedHold);
    }
}
