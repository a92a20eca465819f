//! Loop driver: tick, report, sleep, until told to stop.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::status::TickReport;
use crate::supervisor::Supervisor;

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub faults: u64,
    /// Ticks that failed to drive the actuator and were recovered.
    pub tick_errors: u64,
    pub uptime_ms: u64,
}

/// Drive `sup` until `shutdown` is set or `max_run_ms` has elapsed.
///
/// Actuator errors inside a tick are not fatal: the actuator is released on
/// a best-effort basis and the loop carries on, so the next scheduled
/// evaluation retries. The actuator is always left disengaged on return.
pub fn run<F>(
    sup: &mut Supervisor,
    shutdown: &AtomicBool,
    max_run_ms: Option<u64>,
    mut on_report: F,
) -> Result<RunSummary>
where
    F: FnMut(&TickReport),
{
    sup.begin()?;
    let start_ms = sup.uptime_ms();
    let mut summary = RunSummary::default();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(cap) = max_run_ms
            && sup.uptime_ms().saturating_sub(start_ms) >= cap
        {
            tracing::info!(max_run_ms = cap, "run time cap reached");
            break;
        }

        match sup.tick() {
            Ok(report) => {
                summary.faults += report.faults.len() as u64;
                on_report(&report);
            }
            Err(e) => {
                summary.tick_errors += 1;
                tracing::error!(error = %format!("{e:#}"), "tick failed, releasing actuator");
                sup.recover();
            }
        }
        summary.ticks += 1;
        sup.idle();
    }

    if let Err(e) = sup.disengage_now() {
        tracing::warn!(error = %format!("{e:#}"), "disengage on exit failed");
        sup.recover();
    }
    summary.uptime_ms = sup.uptime_ms().saturating_sub(start_ms);
    tracing::info!(
        ticks = summary.ticks,
        faults = summary.faults,
        tick_errors = summary.tick_errors,
        "supervisor stopped"
    );
    Ok(summary)
}
