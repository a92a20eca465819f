//! `From` implementations bridging `cruise_config` types to `cruise_core` types.

use crate::config::{ActivationCfg, ActuatorCfg, ButtonCfg, ScheduleCfg, Timeouts};

// ── ButtonCfg ────────────────────────────────────────────────────────────────

impl From<&cruise_config::Buttons> for ButtonCfg {
    fn from(c: &cruise_config::Buttons) -> Self {
        Self {
            active_low: c.active_low,
            activate_hold_ms: c.activate_hold_ms,
            adjust_hold_ms: c.adjust_hold_ms,
            adjust_step: c.adjust_step,
            press_debounce_n: c.press_debounce_n,
        }
    }
}

// ── ScheduleCfg ──────────────────────────────────────────────────────────────

impl From<&cruise_config::Schedule> for ScheduleCfg {
    fn from(c: &cruise_config::Schedule) -> Self {
        Self {
            pedal_poll_ms: c.pedal_poll_ms,
            sensor_poll_ms: c.sensor_poll_ms,
            evaluate_ms: c.evaluate_ms,
            status_ms: c.status_ms,
            loop_ms: c.loop_ms,
        }
    }
}

// ── ActuatorCfg ──────────────────────────────────────────────────────────────

impl From<&cruise_config::Actuator> for ActuatorCfg {
    fn from(c: &cruise_config::Actuator) -> Self {
        Self {
            neutral_deg: c.neutral_deg,
            min_deg: c.min_deg,
            max_deg: c.max_deg,
            clamp: c.clamp,
        }
    }
}

// ── ActivationCfg ────────────────────────────────────────────────────────────

impl From<&cruise_config::Activation> for ActivationCfg {
    fn from(c: &cruise_config::Activation) -> Self {
        Self {
            throttle_release_timeout_ms: c.throttle_release_timeout_ms,
            min_speed: c.min_speed,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&cruise_config::Timeouts> for Timeouts {
    fn from(c: &cruise_config::Timeouts) -> Self {
        Self {
            sensor_ms: c.sensor_ms,
        }
    }
}
