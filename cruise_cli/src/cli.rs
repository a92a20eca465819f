//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "cruise", version, about = "Cruise control supervisor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/cruise.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Starting readings for the simulated vehicle (ignored with real hardware).
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct SimArgs {
    /// Simulated road speed
    #[arg(long, value_name = "SPEED", default_value_t = 60)]
    pub sim_speed: i32,
    /// Simulated engine speed
    #[arg(long, value_name = "RPM", default_value_t = 1800)]
    pub sim_rpm: i32,
    /// Simulated ethanol fuel percentage
    #[arg(long, value_name = "PCT", default_value_t = 10)]
    pub sim_fuel: i32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the supervisor loop; serial commands (s=, r=, p=, d=) are read from stdin
    Run {
        /// Stop after this many milliseconds (runs until Ctrl-C when unset)
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Read every sensor once and park the actuator
    SelfCheck {
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Validate the configuration without touching hardware
    Health,
}
