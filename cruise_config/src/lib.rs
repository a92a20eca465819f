#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the cruise supervisor.
//!
//! `Config` and its sections are deserialized from TOML and checked with
//! `Config::validate`. Only `[pins]` is mandatory; every other section falls
//! back to the stock timings (100 ms pedal poll, 300 ms sensor poll, 2 s / 0.5 s
//! hold thresholds, 5 s throttle-release wait).
use serde::Deserialize;

/// BCM pin numbers.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub button_a: u8,
    pub button_b: u8,
    pub button_c: u8,
    pub button_d: u8,
    /// RF receiver "any button" sense line
    pub button_any: u8,
    pub brake: u8,
    pub throttle: u8,
    pub servo: u8,
    pub buzzer: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Buttons {
    /// Treat a low level as pressed (RF receiver grounds the line on press)
    pub active_low: bool,
    /// Hold time before set/resume fire
    pub activate_hold_ms: u64,
    /// Hold time before increase/decrease fire
    pub adjust_hold_ms: u64,
    /// Target change per increase/decrease
    pub adjust_step: i32,
    /// Consecutive active samples before a press counts as stable
    pub press_debounce_n: u8,
}

impl Default for Buttons {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub pedal_poll_ms: u64,
    pub sensor_poll_ms: u64,
    pub evaluate_ms: u64,
    pub status_ms: u64,
    /// Sleep between loop iterations
    pub loop_ms: u64,
}

impl Default for Schedule {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Actuator {
    pub neutral_deg: i32,
    pub min_deg: i32,
    pub max_deg: i32,
    /// Clamp commanded positions into [min_deg, max_deg]
    pub clamp: bool,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
}

impl Default for Actuator {
    fn default() -> Self {
        Self {
            neutral_deg: 0,
            min_deg: 0,
            max_deg: 180,
            clamp: true,
            min_pulse_us: 500,
            max_pulse_us: 2500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Activation {
    /// How long set/resume waits for the throttle pedal to come up
    pub throttle_release_timeout_ms: u64,
    /// Lowest speed at which set/resume is accepted
    pub min_speed: i32,
}

impl Default for Activation {
    fn default() -> Self {
        Self {
            throttle_release_timeout_ms: 5000,
            min_speed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Per-read timeout on the diagnostics link.
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 250 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Obd {
    /// Serial device of the ELM327-style adapter
    pub port: String,
    pub baud: u32,
}

impl Default for Obd {
    fn default() -> Self {
        Self {
            port: "/dev/serial0".to_string(),
            baud: 38_400,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub buttons: Buttons,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub actuator: Actuator,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub obd: Obd,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins: every line needs its own GPIO
        let mut used = vec![
            ("button_a", self.pins.button_a),
            ("button_b", self.pins.button_b),
            ("button_c", self.pins.button_c),
            ("button_d", self.pins.button_d),
            ("button_any", self.pins.button_any),
            ("brake", self.pins.brake),
            ("throttle", self.pins.throttle),
            ("servo", self.pins.servo),
        ];
        if let Some(b) = self.pins.buzzer {
            used.push(("buzzer", b));
        }
        for (i, (name, pin)) in used.iter().enumerate() {
            if *pin > 27 {
                eyre::bail!("pins.{name} must be a BCM GPIO in 0..=27");
            }
            if let Some((other, _)) = used[..i].iter().find(|(_, p)| p == pin) {
                eyre::bail!("pins.{name} reuses GPIO {pin} already assigned to pins.{other}");
            }
        }

        // Buttons
        if self.buttons.activate_hold_ms == 0 {
            eyre::bail!("buttons.activate_hold_ms must be >= 1");
        }
        if self.buttons.adjust_hold_ms == 0 {
            eyre::bail!("buttons.adjust_hold_ms must be >= 1");
        }
        if self.buttons.adjust_step <= 0 {
            eyre::bail!("buttons.adjust_step must be > 0");
        }
        if self.buttons.press_debounce_n == 0 {
            eyre::bail!("buttons.press_debounce_n must be >= 1");
        }

        // Schedule
        for (name, ms) in [
            ("pedal_poll_ms", self.schedule.pedal_poll_ms),
            ("sensor_poll_ms", self.schedule.sensor_poll_ms),
            ("evaluate_ms", self.schedule.evaluate_ms),
            ("status_ms", self.schedule.status_ms),
        ] {
            if ms == 0 {
                eyre::bail!("schedule.{name} must be >= 1");
            }
        }
        if self.schedule.loop_ms > self.schedule.pedal_poll_ms {
            eyre::bail!("schedule.loop_ms must not exceed schedule.pedal_poll_ms");
        }

        // Actuator
        if self.actuator.min_deg >= self.actuator.max_deg {
            eyre::bail!("actuator.min_deg must be < actuator.max_deg");
        }
        if !(self.actuator.min_deg..=self.actuator.max_deg).contains(&self.actuator.neutral_deg) {
            eyre::bail!("actuator.neutral_deg must lie within [min_deg, max_deg]");
        }
        if self.actuator.min_pulse_us >= self.actuator.max_pulse_us {
            eyre::bail!("actuator.min_pulse_us must be < actuator.max_pulse_us");
        }

        // Activation
        if self.activation.throttle_release_timeout_ms == 0 {
            eyre::bail!("activation.throttle_release_timeout_ms must be >= 1");
        }
        if self.activation.throttle_release_timeout_ms > 60_000 {
            eyre::bail!("activation.throttle_release_timeout_ms is unreasonably large (>60s)");
        }
        if self.activation.min_speed < 0 {
            eyre::bail!("activation.min_speed must be >= 0");
        }

        // Timeouts
        if self.timeouts.sensor_ms == 0 {
            eyre::bail!("timeouts.sensor_ms must be >= 1");
        }
        if self.timeouts.sensor_ms >= self.schedule.sensor_poll_ms {
            eyre::bail!("timeouts.sensor_ms must be shorter than schedule.sensor_poll_ms");
        }

        // OBD
        if self.obd.baud == 0 {
            eyre::bail!("obd.baud must be > 0");
        }

        Ok(())
    }
}
