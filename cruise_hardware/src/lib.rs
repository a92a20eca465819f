pub mod error;
pub mod obd;
pub mod util;

#[cfg(feature = "hardware")]
pub mod rpi;

use cruise_traits::{Actuator, Annunciator, BoxError, Cue, InputLine, InputPins, VehicleSensors};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::error::HwError;

/// Simulated diagnostics link.
///
/// Values are shared with a [`SimVehicleHandle`] so a test (or the CLI) can
/// change what the supervisor sees between ticks.
pub struct SimulatedVehicle {
    speed: Rc<Cell<i32>>,
    rpm: Rc<Cell<i32>>,
    fuel_percent: Rc<Cell<i32>>,
    failing: Rc<Cell<bool>>,
}

#[derive(Clone)]
pub struct SimVehicleHandle {
    speed: Rc<Cell<i32>>,
    rpm: Rc<Cell<i32>>,
    fuel_percent: Rc<Cell<i32>>,
    failing: Rc<Cell<bool>>,
}

impl SimulatedVehicle {
    pub fn new(speed: i32, rpm: i32, fuel_percent: i32) -> Self {
        Self {
            speed: Rc::new(Cell::new(speed)),
            rpm: Rc::new(Cell::new(rpm)),
            fuel_percent: Rc::new(Cell::new(fuel_percent)),
            failing: Rc::new(Cell::new(false)),
        }
    }

    pub fn handle(&self) -> SimVehicleHandle {
        SimVehicleHandle {
            speed: self.speed.clone(),
            rpm: self.rpm.clone(),
            fuel_percent: self.fuel_percent.clone(),
            failing: self.failing.clone(),
        }
    }

    fn read(&self, what: &'static str, cell: &Cell<i32>) -> Result<i32, BoxError> {
        if self.failing.get() {
            tracing::debug!(sensor = what, "simulated read failure");
            return Err(Box::new(HwError::Simulated(what)));
        }
        Ok(cell.get())
    }
}

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::new(0, 800, 10)
    }
}

impl SimVehicleHandle {
    pub fn set_speed(&self, v: i32) {
        self.speed.set(v);
    }
    pub fn set_rpm(&self, v: i32) {
        self.rpm.set(v);
    }
    pub fn set_fuel_percent(&self, v: i32) {
        self.fuel_percent.set(v);
    }
    /// Make every subsequent read fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl VehicleSensors for SimulatedVehicle {
    fn read_speed(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.read("speed", &self.speed)
    }
    fn read_rpm(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.read("rpm", &self.rpm)
    }
    fn read_fuel_percent(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.read("fuel", &self.fuel_percent)
    }
}

/// Observable state of a [`SimulatedServo`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServoTrace {
    pub position: i32,
    pub attached: bool,
    /// Every position written, in order.
    pub writes: Vec<i32>,
    pub attach_count: u32,
    pub detach_count: u32,
    /// Make every subsequent write fail.
    pub fail_writes: bool,
}

/// Simulated throttle servo that records what it was told.
#[derive(Default)]
pub struct SimulatedServo {
    trace: Rc<RefCell<ServoTrace>>,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace(&self) -> Rc<RefCell<ServoTrace>> {
        self.trace.clone()
    }
}

impl Actuator for SimulatedServo {
    fn write_position(&mut self, degrees: i32) -> Result<(), BoxError> {
        let mut t = self.trace.borrow_mut();
        if t.fail_writes {
            return Err(Box::new(HwError::Simulated("servo write failed")));
        }
        t.position = degrees;
        t.writes.push(degrees);
        tracing::trace!(degrees, "servo write (simulated)");
        Ok(())
    }
    fn attach(&mut self) -> Result<(), BoxError> {
        let mut t = self.trace.borrow_mut();
        t.attached = true;
        t.attach_count += 1;
        tracing::debug!("servo attached (simulated)");
        Ok(())
    }
    fn detach(&mut self) -> Result<(), BoxError> {
        let mut t = self.trace.borrow_mut();
        t.attached = false;
        t.detach_count += 1;
        tracing::debug!("servo detached (simulated)");
        Ok(())
    }
}

/// Simulated input lines. Every line idles high: RF outputs are idle-high and
/// the pedal switches sit on pull-ups.
#[derive(Default)]
pub struct SimulatedInputs {
    low: Rc<RefCell<HashMap<InputLine, bool>>>,
}

#[derive(Clone)]
pub struct SimInputsHandle {
    low: Rc<RefCell<HashMap<InputLine, bool>>>,
}

impl SimulatedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> SimInputsHandle {
        SimInputsHandle {
            low: self.low.clone(),
        }
    }
}

impl SimInputsHandle {
    /// Pull a line low (pressed, for active-low wiring).
    pub fn set_low(&self, line: InputLine) {
        self.low.borrow_mut().insert(line, true);
    }

    /// Let a line return to its idle-high level.
    pub fn set_high(&self, line: InputLine) {
        self.low.borrow_mut().insert(line, false);
    }
}

impl InputPins for SimulatedInputs {
    fn is_high(&mut self, line: InputLine) -> bool {
        !self.low.borrow().get(&line).copied().unwrap_or(false)
    }
}

/// Annunciator that logs cues and remembers them.
#[derive(Default)]
pub struct SimulatedBuzzer {
    cues: Rc<RefCell<Vec<Cue>>>,
}

impl SimulatedBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Rc<RefCell<Vec<Cue>>> {
        self.cues.clone()
    }
}

impl Annunciator for SimulatedBuzzer {
    fn announce(&mut self, cue: Cue) {
        tracing::info!(?cue, "buzzer (simulated)");
        self.cues.borrow_mut().push(cue);
    }
}
