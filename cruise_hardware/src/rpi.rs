//! Raspberry Pi devices: GPIO inputs, PWM throttle servo, tone buzzer and the
//! UART link to the diagnostics adapter.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use cruise_traits::{Actuator, Annunciator, BoxError, Cue, InputLine, InputPins};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::uart::{Parity, Uart};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};
use crate::obd::ObdTransport;

const SERVO_PERIOD: Duration = Duration::from_millis(20);

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Input lines on pull-ups.
pub struct GpioInputs {
    pins: Vec<(InputLine, InputPin)>,
}

impl GpioInputs {
    pub fn new(lines: &[(InputLine, u8)]) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mut pins = Vec::with_capacity(lines.len());
        for &(line, bcm) in lines {
            let pin = gpio.get(bcm).map_err(gpio_err)?.into_input_pullup();
            debug!(?line, bcm, "input line configured");
            pins.push((line, pin));
        }
        Ok(Self { pins })
    }
}

impl InputPins for GpioInputs {
    fn is_high(&mut self, line: InputLine) -> bool {
        match self.pins.iter().find(|(l, _)| *l == line) {
            Some((_, pin)) => pin.is_high(),
            // An unwired line reads as its pull-up idle level.
            None => true,
        }
    }
}

/// Hobby servo on a software-PWM pin; 0..=`max_degrees` maps linearly onto
/// `min_us..=max_us`.
pub struct PwmServo {
    pin: OutputPin,
    min_us: u32,
    max_us: u32,
    max_degrees: i32,
    degrees: i32,
    attached: bool,
}

impl PwmServo {
    pub fn new(bcm: u8, min_us: u32, max_us: u32, max_degrees: i32) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let pin = gpio.get(bcm).map_err(gpio_err)?.into_output_low();
        Ok(Self {
            pin,
            min_us,
            max_us,
            max_degrees: max_degrees.max(1),
            degrees: 0,
            attached: false,
        })
    }

    fn pulse(&self) -> Duration {
        let deg = self.degrees.clamp(0, self.max_degrees) as u32;
        let span = self.max_us.saturating_sub(self.min_us);
        Duration::from_micros(u64::from(self.min_us + span * deg / self.max_degrees as u32))
    }

    fn drive(&mut self) -> Result<()> {
        let pulse = self.pulse();
        trace!(degrees = self.degrees, pulse_us = pulse.as_micros() as u64, "servo pwm");
        self.pin.set_pwm(SERVO_PERIOD, pulse).map_err(gpio_err)
    }
}

impl Actuator for PwmServo {
    fn write_position(&mut self, degrees: i32) -> std::result::Result<(), BoxError> {
        self.degrees = degrees;
        if self.attached {
            self.drive()?;
        }
        Ok(())
    }

    fn attach(&mut self) -> std::result::Result<(), BoxError> {
        self.drive()?;
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) -> std::result::Result<(), BoxError> {
        self.pin.clear_pwm().map_err(gpio_err)?;
        self.pin.set_low();
        self.attached = false;
        Ok(())
    }
}

/// Piezo buzzer driven from a worker thread so cues never stall the loop.
pub struct ToneBuzzer {
    tx: Option<xch::Sender<Cue>>,
    join_handle: Option<JoinHandle<()>>,
}

impl ToneBuzzer {
    pub fn spawn(bcm: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mut pin = gpio.get(bcm).map_err(gpio_err)?.into_output_low();
        let (tx, rx) = xch::bounded::<Cue>(4);
        let join_handle = std::thread::spawn(move || {
            for cue in rx.iter() {
                let (freq, pulses, on, off) = match cue {
                    Cue::ActivationConfirmed => (2000.0, 2, 80, 80),
                    Cue::Disengaged => (400.0, 3, 150, 100),
                };
                for _ in 0..pulses {
                    if let Err(e) = pin.set_pwm_frequency(freq, 0.5) {
                        warn!(error = %e, "buzzer pwm failed");
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(on));
                    let _ = pin.clear_pwm();
                    std::thread::sleep(Duration::from_millis(off));
                }
            }
            trace!("buzzer worker exiting");
        });
        Ok(Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
        })
    }
}

impl Annunciator for ToneBuzzer {
    fn announce(&mut self, cue: Cue) {
        if let Some(tx) = &self.tx
            && tx.try_send(cue).is_err()
        {
            debug!(?cue, "buzzer busy, cue dropped");
        }
    }
}

impl Drop for ToneBuzzer {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(h) = self.join_handle.take() {
            let _ = h.join();
        }
    }
}

/// Non-blocking UART to the diagnostics adapter.
pub struct UartTransport(Uart);

impl UartTransport {
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let mut uart = Uart::with_path(path, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        uart.set_read_mode(0, Duration::ZERO)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        Ok(Self(uart))
    }
}

impl ObdTransport for UartTransport {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let n = self.0.write(bytes).map_err(|e| HwError::Uart(e.to_string()))?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf).map_err(|e| HwError::Uart(e.to_string()))
    }
}
