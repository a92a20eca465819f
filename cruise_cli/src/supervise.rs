//! Device assembly plus the `run` and `self-check` commands.

use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use cruise_core::error::{FaultReason, Result as CoreResult};
use cruise_core::{
    ChannelCommandSource, RunSummary, Set, StatusSnapshot, Supervisor, SupervisorBuilder,
    TickReport,
};
use cruise_traits::{Actuator, Annunciator, InputPins, VehicleSensors};
use serde_json::json;

use crate::cli::SimArgs;

pub fn fault_reason_name(r: &FaultReason) -> &'static str {
    match r {
        FaultReason::SafetyOverride(_) => "SafetyOverride",
        FaultReason::SensorRead { .. } => "SensorRead",
        FaultReason::ActivationTimeout(_) => "ActivationTimeout",
        FaultReason::UnknownCommand(_) => "UnknownCommand",
    }
}

/// Everything the supervisor drives, boxed so sim and hardware share one path.
pub struct Devices {
    pub sensors: Box<dyn VehicleSensors>,
    pub actuator: Box<dyn Actuator>,
    pub inputs: Box<dyn InputPins>,
    pub cues: Box<dyn Annunciator>,
}

#[cfg(not(feature = "hardware"))]
pub fn open_devices(_cfg: &cruise_config::Config, sim: SimArgs) -> eyre::Result<Devices> {
    use cruise_hardware::{SimulatedBuzzer, SimulatedInputs, SimulatedServo, SimulatedVehicle};

    let vehicle = SimulatedVehicle::new(sim.sim_speed, sim.sim_rpm, sim.sim_fuel);
    // Test hook: every sensor read fails.
    if std::env::var_os("CRUISE_TEST_SIM_SENSOR_FAIL").is_some() {
        vehicle.handle().set_failing(true);
    }
    tracing::info!(
        speed = sim.sim_speed,
        rpm = sim.sim_rpm,
        fuel = sim.sim_fuel,
        "using simulated vehicle"
    );
    Ok(Devices {
        sensors: Box::new(vehicle),
        actuator: Box::new(SimulatedServo::new()),
        inputs: Box::new(SimulatedInputs::new()),
        cues: Box::new(SimulatedBuzzer::new()),
    })
}

#[cfg(feature = "hardware")]
pub fn open_devices(cfg: &cruise_config::Config, _sim: SimArgs) -> eyre::Result<Devices> {
    use cruise_core::mocks::SilentAnnunciator;
    use cruise_hardware::obd::ObdGateway;
    use cruise_hardware::rpi::{GpioInputs, PwmServo, ToneBuzzer, UartTransport};
    use cruise_traits::InputLine;
    use eyre::WrapErr;

    let p = &cfg.pins;
    let inputs = GpioInputs::new(&[
        (InputLine::ButtonA, p.button_a),
        (InputLine::ButtonB, p.button_b),
        (InputLine::ButtonC, p.button_c),
        (InputLine::ButtonD, p.button_d),
        (InputLine::AnyButton, p.button_any),
        (InputLine::Brake, p.brake),
        (InputLine::Throttle, p.throttle),
    ])
    .wrap_err("open input pins")?;
    let servo = PwmServo::new(
        p.servo,
        cfg.actuator.min_pulse_us,
        cfg.actuator.max_pulse_us,
        cfg.actuator.max_deg,
    )
    .wrap_err("open servo pin")?;
    let link = UartTransport::open(&cfg.obd.port, cfg.obd.baud)
        .wrap_err_with(|| format!("open obd adapter {}", cfg.obd.port))?;
    let cues: Box<dyn Annunciator> = match p.buzzer {
        Some(bcm) => Box::new(ToneBuzzer::spawn(bcm).wrap_err("open buzzer pin")?),
        None => Box::new(SilentAnnunciator),
    };
    tracing::info!(port = %cfg.obd.port, baud = cfg.obd.baud, "hardware devices ready");
    Ok(Devices {
        sensors: Box::new(ObdGateway::new(link)),
        actuator: Box::new(servo),
        inputs: Box::new(inputs),
        cues,
    })
}

fn supervisor_for(cfg: &cruise_config::Config, devices: Devices) -> SupervisorBuilder<Set, Set, Set> {
    Supervisor::builder()
        .with_sensors(devices.sensors)
        .with_actuator(devices.actuator)
        .with_inputs(devices.inputs)
        .with_annunciator(devices.cues)
        .with_config(cfg)
}

fn opt(v: Option<i32>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn status_json(s: &StatusSnapshot) -> serde_json::Value {
    json!({
        "event": "status",
        "uptime_ms": s.uptime_ms,
        "mode": s.mode.as_str(),
        "target": s.target,
        "speed": s.vehicle.speed,
        "rpm": s.vehicle.rpm,
        "fuel_percent": s.vehicle.fuel_percent,
        "brake_pressed": s.vehicle.brake.is_pressed(),
        "throttle_pressed": s.vehicle.throttle.is_pressed(),
        "engaged": s.actuator.engaged,
        "position": s.actuator.position,
        "activation_pending": s.activation_pending,
    })
}

fn print_status(s: &StatusSnapshot, json_mode: bool) {
    if json_mode {
        println!("{}", status_json(s));
    } else {
        println!(
            "[{:>8} ms] mode={} target={} speed={} rpm={} fuel={}% servo={}{}{}",
            s.uptime_ms,
            s.mode,
            s.target,
            opt(s.vehicle.speed),
            opt(s.vehicle.rpm),
            opt(s.vehicle.fuel_percent),
            s.actuator.position,
            if s.actuator.engaged { "" } else { " (detached)" },
            if s.activation_pending {
                " waiting for throttle"
            } else {
                ""
            },
        );
    }
}

pub fn print_report(report: &TickReport, json_mode: bool) {
    for fault in &report.faults {
        if json_mode {
            println!(
                "{}",
                json!({
                    "event": "fault",
                    "reason": fault_reason_name(fault),
                    "message": fault.to_string(),
                })
            );
        } else {
            println!("fault: {fault}");
        }
    }
    if let Some(s) = &report.status {
        print_status(s, json_mode);
    }
}

fn print_summary(summary: &RunSummary, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            json!({
                "event": "summary",
                "ticks": summary.ticks,
                "faults": summary.faults,
                "tick_errors": summary.tick_errors,
                "uptime_ms": summary.uptime_ms,
            })
        );
    } else {
        println!(
            "stopped after {} ms: {} ticks, {} faults, {} recovered tick errors",
            summary.uptime_ms, summary.ticks, summary.faults, summary.tick_errors
        );
    }
}

/// Run the supervisor, taking serial commands from stdin, until `shutdown`
/// is set or `max_run_ms` elapses.
pub fn run_supervisor(
    cfg: &cruise_config::Config,
    devices: Devices,
    max_run_ms: Option<u64>,
    shutdown: Arc<AtomicBool>,
    json_mode: bool,
) -> CoreResult<RunSummary> {
    // The reader thread stays blocked on stdin until the process exits.
    let (commands, _reader) = ChannelCommandSource::spawn_reader(BufReader::new(std::io::stdin()));
    let mut sup = supervisor_for(cfg, devices).with_commands(commands).build()?;

    tracing::info!(?max_run_ms, "cruise supervisor running");
    let summary = cruise_core::run(&mut sup, &shutdown, max_run_ms, |report| {
        print_report(report, json_mode);
    })?;
    print_summary(&summary, json_mode);
    Ok(summary)
}

/// Read every sensor once with the actuator parked.
pub fn self_check(
    cfg: &cruise_config::Config,
    devices: Devices,
    json_mode: bool,
) -> CoreResult<()> {
    let mut sup = supervisor_for(cfg, devices).build()?;
    sup.begin()?;
    let state = sup.self_check();
    sup.disengage_now()?;
    let state = state?;

    if json_mode {
        println!(
            "{}",
            json!({
                "event": "self_check",
                "ok": true,
                "speed": state.speed,
                "rpm": state.rpm,
                "fuel_percent": state.fuel_percent,
            })
        );
    } else {
        println!(
            "self-check ok: speed={} rpm={} fuel={}%",
            opt(state.speed),
            opt(state.rpm),
            opt(state.fuel_percent)
        );
    }
    Ok(())
}
