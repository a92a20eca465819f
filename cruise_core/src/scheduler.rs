//! Fixed-period task timing for the supervisor loop.
//!
//! Tasks are polled, never self-scheduled: the tick asks each timer whether
//! it is due. A late tick does not cause catch-up bursts.

use crate::config::ScheduleCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    pub period_ms: u64,
    next_due_ms: u64,
}

impl Periodic {
    /// Due on the first check.
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            next_due_ms: 0,
        }
    }

    /// Returns `true` and re-arms when `now_ms` has reached the due time.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms >= self.next_due_ms {
            self.next_due_ms = now_ms.saturating_add(self.period_ms);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.next_due_ms = now_ms;
    }
}

/// The four periodic tasks of the supervisor.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub pedals: Periodic,
    pub sensors: Periodic,
    pub evaluate: Periodic,
    pub status: Periodic,
}

impl Schedule {
    pub fn new(cfg: &ScheduleCfg) -> Self {
        Self {
            pedals: Periodic::new(cfg.pedal_poll_ms),
            sensors: Periodic::new(cfg.sensor_poll_ms),
            evaluate: Periodic::new(cfg.evaluate_ms),
            status: Periodic::new(cfg.status_ms),
        }
    }

    /// Make every task due at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        for t in [
            &mut self.pedals,
            &mut self.sensors,
            &mut self.evaluate,
            &mut self.status,
        ] {
            t.reset(now_ms);
        }
    }
}
