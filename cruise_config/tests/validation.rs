use cruise_config::{load_file, load_toml};
use rstest::rstest;
use std::io::Write;

const PINS: &str = r#"
[pins]
button_a = 5
button_b = 6
button_c = 13
button_d = 19
button_any = 26
brake = 20
throttle = 21
servo = 18
buzzer = 12
"#;

#[test]
fn minimal_config_uses_stock_timings() {
    let cfg = load_toml(PINS).expect("parse TOML");
    cfg.validate().expect("minimal config should pass");
    assert_eq!(cfg.schedule.pedal_poll_ms, 100);
    assert_eq!(cfg.schedule.sensor_poll_ms, 300);
    assert_eq!(cfg.schedule.evaluate_ms, 300);
    assert_eq!(cfg.schedule.status_ms, 2000);
    assert_eq!(cfg.buttons.activate_hold_ms, 2000);
    assert_eq!(cfg.buttons.adjust_hold_ms, 500);
    assert_eq!(cfg.buttons.adjust_step, 5);
    assert_eq!(cfg.activation.throttle_release_timeout_ms, 5000);
    assert_eq!(cfg.activation.min_speed, 0);
    assert!(cfg.buttons.active_low);
}

#[test]
fn missing_pins_is_a_parse_error() {
    assert!(load_toml("[buttons]\nactive_low = false\n").is_err());
}

#[rstest]
#[case("[buttons]\nactivate_hold_ms = 0\n", "activate_hold_ms")]
#[case("[buttons]\nadjust_step = 0\n", "adjust_step")]
#[case("[schedule]\npedal_poll_ms = 0\n", "pedal_poll_ms")]
#[case("[schedule]\nloop_ms = 500\n", "loop_ms")]
#[case("[actuator]\nmin_deg = 90\nmax_deg = 10\n", "min_deg")]
#[case("[actuator]\nneutral_deg = 200\n", "neutral_deg")]
#[case("[activation]\nthrottle_release_timeout_ms = 0\n", "throttle_release_timeout_ms")]
#[case("[activation]\nmin_speed = -1\n", "min_speed")]
#[case("[timeouts]\nsensor_ms = 300\n", "sensor_ms")]
fn rejects_out_of_range_values(#[case] extra: &str, #[case] needle: &str) {
    let toml = format!("{PINS}\n{extra}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn rejects_shared_gpio() {
    let toml = PINS.replace("throttle = 21", "throttle = 20");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate pin");
    assert!(format!("{err}").contains("pins.throttle reuses GPIO 20"));
}

#[test]
fn sensor_timeout_is_only_read_from_sensor_ms() {
    let toml = format!("{PINS}\n[timeouts]\nsample_ms = 120\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert_eq!(cfg.timeouts.sensor_ms, 250);

    let toml = format!("{PINS}\n[timeouts]\nsensor_ms = 120\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert_eq!(cfg.timeouts.sensor_ms, 120);
}

#[test]
fn load_file_parses_and_validates() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{PINS}\n[activation]\nmin_speed = 30\n").unwrap();
    let cfg = load_file(f.path()).expect("load");
    assert_eq!(cfg.activation.min_speed, 30);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, "{PINS}\n[buttons]\nadjust_hold_ms = 0\n").unwrap();
    let err = load_file(bad.path()).expect_err("invalid");
    assert!(format!("{err}").contains("adjust_hold_ms"));
}

#[test]
fn shipped_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/cruise.toml");
    let cfg = load_file(&path).expect("etc/cruise.toml should load");
    assert_eq!(cfg.pins.buzzer, Some(12));
    assert!(cfg.logging.file.is_none());
}
