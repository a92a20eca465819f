//! Remote button debouncing with hold-to-activate semantics.
//!
//! The RF receiver drives four button lines plus a shared sense line. A
//! button counts as pressed only while its own line and the sense line are
//! both active, which filters out floating lines. A held button fires once
//! its hold threshold is exceeded, and only once per physical hold.
//! Release is immediate: a spurious release can only cost an event, never
//! trigger one.

use cruise_traits::{InputLine, InputPins};

use crate::config::ButtonCfg;
use crate::types::ButtonId;

/// Per-button debounce state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonChannel {
    /// Last sampled (combined) activity.
    pub pin_level: bool,
    /// Press accepted as stable.
    pub stable: bool,
    pub press_started_ms: Option<u64>,
    /// Hold already fired for this press; cleared only on release.
    pub hold_consumed: bool,
    active_count: u8,
}

impl ButtonChannel {
    /// Feed one sample. Returns `true` on the sample where the hold fires.
    pub fn sample(&mut self, active: bool, now_ms: u64, threshold_ms: u64, debounce_n: u8) -> bool {
        self.pin_level = active;
        if !active {
            self.stable = false;
            self.press_started_ms = None;
            self.hold_consumed = false;
            self.active_count = 0;
            return false;
        }

        if !self.stable {
            self.active_count = self.active_count.saturating_add(1);
            if self.active_count < debounce_n.max(1) {
                return false;
            }
            self.stable = true;
            self.press_started_ms = Some(now_ms);
        }

        if self.hold_consumed {
            return false;
        }
        match self.press_started_ms {
            Some(start) if now_ms.saturating_sub(start) > threshold_ms => {
                self.hold_consumed = true;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputDebouncer {
    channels: [ButtonChannel; 4],
    cfg: ButtonCfg,
}

impl InputDebouncer {
    pub fn new(cfg: ButtonCfg) -> Self {
        Self {
            channels: Default::default(),
            cfg,
        }
    }

    /// Read the five receiver lines and return the buttons whose hold fired.
    pub fn poll(&mut self, pins: &mut dyn InputPins, now_ms: u64) -> Vec<ButtonId> {
        let active_low = self.cfg.active_low;
        let mut active = |line: InputLine| pins.is_high(line) != active_low;
        let sense = active(InputLine::AnyButton);
        let lines = ButtonId::ALL.map(|id| active(id.line()));
        self.sample(lines, sense, now_ms)
    }

    /// Feed already-interpreted activity levels (index = `ButtonId::index`).
    pub fn sample(&mut self, lines: [bool; 4], sense: bool, now_ms: u64) -> Vec<ButtonId> {
        let mut fired = Vec::new();
        for id in ButtonId::ALL {
            let threshold = self.cfg.hold_threshold_ms(id);
            let pressed = lines[id.index()] && sense;
            if self.channels[id.index()].sample(
                pressed,
                now_ms,
                threshold,
                self.cfg.press_debounce_n,
            ) {
                tracing::debug!(button = ?id, threshold_ms = threshold, "button hold");
                fired.push(id);
            }
        }
        fired
    }

    pub fn channel(&self, id: ButtonId) -> &ButtonChannel {
        &self.channels[id.index()]
    }

    pub fn reset(&mut self) {
        self.channels = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(id: ButtonId) -> [bool; 4] {
        let mut l = [false; 4];
        l[id.index()] = true;
        l
    }

    #[test]
    fn hold_fires_once_past_threshold() {
        let mut d = InputDebouncer::new(ButtonCfg::default());
        let mut fired = Vec::new();
        for t in (0..=5000).step_by(10) {
            fired.extend(d.sample(only(ButtonId::A), true, t));
        }
        assert_eq!(fired, vec![ButtonId::A]);
        assert!(d.channel(ButtonId::A).hold_consumed);
    }

    #[test]
    fn threshold_is_strict() {
        let mut d = InputDebouncer::new(ButtonCfg::default());
        assert!(d.sample(only(ButtonId::B), true, 0).is_empty());
        assert!(d.sample(only(ButtonId::B), true, 500).is_empty());
        assert_eq!(d.sample(only(ButtonId::B), true, 501), vec![ButtonId::B]);
    }

    #[test]
    fn sense_line_gates_presses() {
        let mut d = InputDebouncer::new(ButtonCfg::default());
        for t in (0..=3000).step_by(10) {
            assert!(d.sample(only(ButtonId::C), false, t).is_empty());
        }
        assert!(!d.channel(ButtonId::C).stable);
    }

    #[test]
    fn release_rearms_the_hold() {
        let mut d = InputDebouncer::new(ButtonCfg::default());
        d.sample(only(ButtonId::D), true, 0);
        assert_eq!(d.sample(only(ButtonId::D), true, 600), vec![ButtonId::D]);
        d.sample([false; 4], true, 610);
        let ch = d.channel(ButtonId::D);
        assert!(!ch.hold_consumed && !ch.stable && ch.press_started_ms.is_none());
        d.sample(only(ButtonId::D), true, 700);
        assert_eq!(d.sample(only(ButtonId::D), true, 1201), vec![ButtonId::D]);
    }

    #[test]
    fn press_debounce_delays_the_press_start() {
        let cfg = ButtonCfg {
            press_debounce_n: 3,
            ..ButtonCfg::default()
        };
        let mut d = InputDebouncer::new(cfg);
        d.sample(only(ButtonId::B), true, 0);
        d.sample(only(ButtonId::B), true, 10);
        assert!(!d.channel(ButtonId::B).stable);
        d.sample(only(ButtonId::B), true, 20);
        assert_eq!(d.channel(ButtonId::B).press_started_ms, Some(20));
        assert!(d.sample(only(ButtonId::B), true, 520).is_empty());
        assert_eq!(d.sample(only(ButtonId::B), true, 521), vec![ButtonId::B]);
    }
}
