#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod supervise;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    // Logging needs the [logging] section, so a config error is logged to
    // the console only.
    let cfg = load_config(&cli.config);
    let _file_guard = init_logging(&cli, cfg.as_ref().ok().map(|c| &c.logging))?;
    let cfg = cfg?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Health => {
            if cli.json {
                println!(
                    "{}",
                    json!({ "status": "ok", "config": cli.config.display().to_string() })
                );
            } else {
                println!("ok: {} is valid", cli.config.display());
            }
            Ok(())
        }
        Commands::SelfCheck { sim } => {
            let devices = supervise::open_devices(&cfg, sim)?;
            supervise::self_check(&cfg, devices, cli.json)
        }
        Commands::Run { max_run_ms, sim } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let devices = supervise::open_devices(&cfg, sim)?;
            supervise::run_supervisor(&cfg, devices, max_run_ms, shutdown, cli.json)?;
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> eyre::Result<cruise_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = cruise_config::load_toml(&text)?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console logs go to stderr (stdout carries reports); RUST_LOG wins over
/// --log-level. `[logging] file` adds a JSON-lines file sink, flushed when
/// the returned guard drops.
fn init_logging(
    cli: &Cli,
    logging: Option<&cruise_config::Logging>,
) -> eyre::Result<Option<WorkerGuard>> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .wrap_err_with(|| format!("invalid --log-level {:?}", cli.log_level))?,
    };
    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    }
    .with_filter(console_filter);

    let mut guard = None;
    let file = match logging.and_then(|l| l.file.as_deref().map(|f| (l, f))) {
        Some((l, path)) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file {} has no file name", path.display()))?;
            let appender = match l.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                "never" => tracing_appender::rolling::never(dir, name),
                other => eyre::bail!("logging.rotation must be never, daily or hourly (got {other:?})"),
            };
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            let level = l.level.as_deref().unwrap_or("info");
            let filter = EnvFilter::try_new(level)
                .wrap_err_with(|| format!("invalid logging.level {level:?}"))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))?;
    Ok(guard)
}
