#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Cruise supervisor core (hardware-agnostic).
//!
//! Every hardware interaction goes through the `cruise_traits` seams:
//! `VehicleSensors`, `Actuator`, `InputPins`, `Annunciator` and
//! `CommandSource`.
//!
//! ## Architecture
//!
//! - **Input debouncer**: button holds with per-button thresholds (`debounce`)
//! - **Serial protocol**: `s=`/`r=`/`p=`/`d=` line parsing (`serial`)
//! - **Command arbiter**: pedal override > serial > buttons (`arbiter`)
//! - **Throttle-release wait**: deadline-bound suspend point for set/resume (`activation`)
//! - **Actuation engine**: servo engage/disengage side effects (`actuation`)
//! - **Supervisor**: the fixed-order tick over periodic tasks (`supervisor`, `scheduler`)
//! - **Runner**: loop driver with shutdown and run-time cap (`runner`)
//!
//! The supervisor is single-threaded and never blocks on anything but the
//! configured sensor read timeout.

pub mod activation;
pub mod actuation;
pub mod arbiter;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod debounce;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod serial;
pub mod status;
pub mod supervisor;
pub mod types;

pub use activation::{ActivationKind, ActivationRequest, PendingActivation, WaitOutcome};
pub use actuation::{ActuationEngine, ActuatorState};
pub use arbiter::{CommandArbiter, Resolution};
pub use builder::{Missing, Set, SupervisorBuilder};
pub use config::{ActivationCfg, ActuatorCfg, ButtonCfg, ScheduleCfg, Timeouts};
pub use debounce::{ButtonChannel, InputDebouncer};
pub use error::{BuildError, CruiseError, FaultReason, Result};
pub use runner::{RunSummary, run};
pub use serial::{ChannelCommandSource, SerialCommand, parse_line};
pub use status::{StatusSnapshot, TickReport};
pub use supervisor::Supervisor;
pub use types::{ButtonId, ControlIntent, ControlMode, Pedal, PedalState, Sensor, VehicleState};
