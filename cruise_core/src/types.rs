//! Shared value types: control mode and intent, pedal and vehicle state,
//! button identities.

use core::fmt;

use cruise_traits::InputLine;

/// The authoritative control objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlMode {
    #[default]
    Disengaged,
    SpeedHold,
    RpmHold,
    ManualPosition,
}

impl ControlMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disengaged => "disengaged",
            Self::SpeedHold => "speed_hold",
            Self::RpmHold => "rpm_hold",
            Self::ManualPosition => "manual_position",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode plus the value it tracks (speed, rpm or raw servo degrees).
///
/// When `mode` is DISENGAGED the target is kept for resume but never drives
/// the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlIntent {
    pub mode: ControlMode,
    pub target: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PedalState {
    Pressed,
    #[default]
    Released,
}

impl PedalState {
    /// Pedal switches sit on pull-ups: low means pressed.
    pub fn from_level(is_high: bool) -> Self {
        if is_high {
            Self::Released
        } else {
            Self::Pressed
        }
    }

    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pedal {
    Brake,
    Throttle,
}

impl fmt::Display for Pedal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brake => "brake",
            Self::Throttle => "throttle",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Speed,
    Rpm,
    Fuel,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Speed => "speed",
            Self::Rpm => "rpm",
            Self::Fuel => "fuel",
        })
    }
}

/// Latest sensor and pedal readings. `None` marks a value whose last read
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VehicleState {
    pub speed: Option<i32>,
    pub rpm: Option<i32>,
    pub fuel_percent: Option<i32>,
    pub brake: PedalState,
    pub throttle: PedalState,
}

impl VehicleState {
    /// The pedal currently overriding the controller, brake first.
    pub fn override_pedal(&self) -> Option<Pedal> {
        if self.brake.is_pressed() {
            Some(Pedal::Brake)
        } else if self.throttle.is_pressed() {
            Some(Pedal::Throttle)
        } else {
            None
        }
    }

    /// Some reading is unknown because its last poll failed.
    pub fn sensors_lost(&self) -> bool {
        self.speed.is_none() || self.rpm.is_none() || self.fuel_percent.is_none()
    }
}

/// The four remote buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// Set: latch the current speed and engage.
    A,
    /// Increase target.
    B,
    /// Resume the last target.
    C,
    /// Decrease target.
    D,
}

impl ButtonId {
    pub const ALL: [ButtonId; 4] = [ButtonId::A, ButtonId::B, ButtonId::C, ButtonId::D];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    pub fn line(self) -> InputLine {
        match self {
            Self::A => InputLine::ButtonA,
            Self::B => InputLine::ButtonB,
            Self::C => InputLine::ButtonC,
            Self::D => InputLine::ButtonD,
        }
    }

    /// Set and resume need the long hold.
    pub fn is_activation(self) -> bool {
        matches!(self, Self::A | Self::C)
    }
}
