//! Throttle-release wait guarding set/resume.
//!
//! Activation must not fight a driver who is still on the throttle. A
//! pending activation suspends normal scheduling until the throttle reads
//! released, the brake is pressed or the deadline passes.

use crate::types::{Pedal, PedalState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Button A: latch the current speed.
    Set,
    /// Button C: reuse the stored target.
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationRequest {
    pub kind: ActivationKind,
    pub target: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Pending,
    Released,
    TimedOut,
    Cancelled(Pedal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActivation {
    pub request: ActivationRequest,
    pub started_ms: u64,
    pub deadline_ms: u64,
}

impl PendingActivation {
    pub fn start(request: ActivationRequest, now_ms: u64, timeout_ms: u64) -> Self {
        Self {
            request,
            started_ms: now_ms,
            deadline_ms: now_ms.saturating_add(timeout_ms),
        }
    }

    /// Check the pedals once. Brake wins over a released throttle.
    pub fn poll(&self, brake: PedalState, throttle: PedalState, now_ms: u64) -> WaitOutcome {
        if brake.is_pressed() {
            WaitOutcome::Cancelled(Pedal::Brake)
        } else if !throttle.is_pressed() {
            WaitOutcome::Released
        } else if now_ms >= self.deadline_ms {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Pending
        }
    }

    pub fn waited_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pending() -> PendingActivation {
        PendingActivation::start(
            ActivationRequest {
                kind: ActivationKind::Set,
                target: 60,
            },
            1_000,
            5_000,
        )
    }

    #[rstest]
    #[case(PedalState::Released, PedalState::Released, 1_000, WaitOutcome::Released)]
    #[case(PedalState::Released, PedalState::Pressed, 5_999, WaitOutcome::Pending)]
    #[case(PedalState::Released, PedalState::Pressed, 6_000, WaitOutcome::TimedOut)]
    #[case(PedalState::Released, PedalState::Released, 9_000, WaitOutcome::Released)]
    #[case(PedalState::Pressed, PedalState::Released, 1_100, WaitOutcome::Cancelled(Pedal::Brake))]
    #[case(PedalState::Pressed, PedalState::Pressed, 7_000, WaitOutcome::Cancelled(Pedal::Brake))]
    fn outcomes(
        #[case] brake: PedalState,
        #[case] throttle: PedalState,
        #[case] now: u64,
        #[case] want: WaitOutcome,
    ) {
        assert_eq!(pending().poll(brake, throttle, now), want);
    }

    #[test]
    fn deadline_saturates() {
        let p = PendingActivation::start(
            ActivationRequest {
                kind: ActivationKind::Resume,
                target: 1,
            },
            u64::MAX - 10,
            5_000,
        );
        assert_eq!(p.deadline_ms, u64::MAX);
        assert_eq!(p.waited_ms(u64::MAX - 4), 6);
    }
}
