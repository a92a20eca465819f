//! Hardware seams for the cruise supervisor.
//!
//! The core never touches pins, buses or timers directly; it talks to these
//! traits. Errors cross the seam as `Box<dyn Error + Send + Sync>` and are
//! mapped to typed errors inside `cruise_core`.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Read side of the vehicle diagnostics link.
pub trait VehicleSensors {
    fn read_speed(&mut self, timeout: Duration) -> Result<i32, BoxError>;
    fn read_rpm(&mut self, timeout: Duration) -> Result<i32, BoxError>;
    fn read_fuel_percent(&mut self, timeout: Duration) -> Result<i32, BoxError>;
}

/// The throttle-pulling servo.
pub trait Actuator {
    /// Command the servo to `degrees`.
    fn write_position(&mut self, degrees: i32) -> Result<(), BoxError>;
    /// Take mechanical control of the throttle cable.
    fn attach(&mut self) -> Result<(), BoxError>;
    /// Release the throttle back to the driver.
    fn detach(&mut self) -> Result<(), BoxError>;
}

/// Digital input lines sampled by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLine {
    ButtonA,
    ButtonB,
    ButtonC,
    ButtonD,
    /// Shared "some button is pressed" sense line of the RF receiver.
    AnyButton,
    Brake,
    Throttle,
}

/// Raw pin levels. Active-level interpretation belongs to the caller.
pub trait InputPins {
    fn is_high(&mut self, line: InputLine) -> bool;
}

/// Audible feedback cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Two short tones: throttle released, hold engaged.
    ActivationConfirmed,
    /// Three low pulses: control handed back to the driver.
    Disengaged,
}

/// Fire-and-forget feedback sink. Implementations must not block the loop.
pub trait Annunciator {
    fn announce(&mut self, cue: Cue);
}

/// Line-oriented serial command channel.
pub trait CommandSource {
    /// Next complete line, if one has arrived.
    fn poll_line(&mut self) -> Option<String>;
}

impl<T: VehicleSensors + ?Sized> VehicleSensors for Box<T> {
    fn read_speed(&mut self, timeout: Duration) -> Result<i32, BoxError> {
        (**self).read_speed(timeout)
    }
    fn read_rpm(&mut self, timeout: Duration) -> Result<i32, BoxError> {
        (**self).read_rpm(timeout)
    }
    fn read_fuel_percent(&mut self, timeout: Duration) -> Result<i32, BoxError> {
        (**self).read_fuel_percent(timeout)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn write_position(&mut self, degrees: i32) -> Result<(), BoxError> {
        (**self).write_position(degrees)
    }
    fn attach(&mut self) -> Result<(), BoxError> {
        (**self).attach()
    }
    fn detach(&mut self) -> Result<(), BoxError> {
        (**self).detach()
    }
}

impl<T: InputPins + ?Sized> InputPins for Box<T> {
    fn is_high(&mut self, line: InputLine) -> bool {
        (**self).is_high(line)
    }
}

impl<T: Annunciator + ?Sized> Annunciator for Box<T> {
    fn announce(&mut self, cue: Cue) {
        (**self).announce(cue);
    }
}

impl<T: CommandSource + ?Sized> CommandSource for Box<T> {
    fn poll_line(&mut self) -> Option<String> {
        (**self).poll_line()
    }
}
