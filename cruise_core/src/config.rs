//! Configuration types for the supervisor.
//!
//! These are the runtime configuration structs used by `Supervisor`.
//! They are separate from the TOML-deserialized config in `cruise_config`.

use crate::types::ButtonId;

/// Remote button handling.
#[derive(Debug, Clone)]
pub struct ButtonCfg {
    /// Treat a low level as pressed, on both the button lines and the sense line.
    pub active_low: bool,
    /// Hold time before set (A) or resume (C) fires.
    pub activate_hold_ms: u64,
    /// Hold time before increase (B) or decrease (D) fires.
    pub adjust_hold_ms: u64,
    /// Target change applied by B and D.
    pub adjust_step: i32,
    /// Consecutive active samples before a press is stable (1 = immediate).
    pub press_debounce_n: u8,
}

impl ButtonCfg {
    pub fn hold_threshold_ms(&self, id: ButtonId) -> u64 {
        if id.is_activation() {
            self.activate_hold_ms
        } else {
            self.adjust_hold_ms
        }
    }
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self {
            active_low: true,
            activate_hold_ms: 2000,
            adjust_hold_ms: 500,
            adjust_step: 5,
            press_debounce_n: 1,
        }
    }
}

/// Periods of the scheduled tasks, in milliseconds.
#[derive(Debug, Clone)]
pub struct ScheduleCfg {
    pub pedal_poll_ms: u64,
    pub sensor_poll_ms: u64,
    pub evaluate_ms: u64,
    pub status_ms: u64,
    /// Idle time between loop iterations.
    pub loop_ms: u64,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            pedal_poll_ms: 100,
            sensor_poll_ms: 300,
            evaluate_ms: 300,
            status_ms: 2000,
            loop_ms: 10,
        }
    }
}

/// Servo geometry.
#[derive(Debug, Clone)]
pub struct ActuatorCfg {
    /// Position written before every detach.
    pub neutral_deg: i32,
    pub min_deg: i32,
    pub max_deg: i32,
    /// Clamp commanded positions into `[min_deg, max_deg]`.
    pub clamp: bool,
}

impl ActuatorCfg {
    pub fn commanded_position(&self, target: i32) -> i32 {
        if self.clamp {
            target.clamp(self.min_deg, self.max_deg)
        } else {
            target
        }
    }
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            neutral_deg: 0,
            min_deg: 0,
            max_deg: 180,
            clamp: true,
        }
    }
}

/// Set/resume activation sequence.
#[derive(Debug, Clone)]
pub struct ActivationCfg {
    pub throttle_release_timeout_ms: u64,
    /// Set and resume are ignored below this speed.
    pub min_speed: i32,
}

impl Default for ActivationCfg {
    fn default() -> Self {
        Self {
            throttle_release_timeout_ms: 5000,
            min_speed: 0,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait per diagnostics-link read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 250 }
    }
}
