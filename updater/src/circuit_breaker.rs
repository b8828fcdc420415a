//! Circuit breaker guarding the submit loop: 10 consecutive failures opens
//! it for 60 s, then a single half-open probe either closes it (success) or
//! reopens it (failure).
//!
//! A plain state machine driven by `Instant::now()` at the call site rather
//! than an internal timer task — the submit loop already ticks on a fixed
//! cadence, so there is nothing to gain from a background clock here.

use std::time::{Duration, Instant};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    failure_threshold: u32,
    open_duration: Duration,
}

/// What the submit loop should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Proceed with a normal submission attempt.
    Allow,
    /// This tick is the single half-open probe; record its outcome.
    Probe,
    /// Breaker is open and the cooldown hasn't elapsed; skip this tick.
    Reject,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_duration_ms: u64) -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            failure_threshold,
            open_duration: Duration::from_millis(open_duration_ms),
        }
    }

    /// Call once per submit tick before attempting a submission.
    pub fn admit(&mut self) -> Admission {
        match self.state {
            BreakerState::Closed => Admission::Allow,
            BreakerState::Open => {
                let elapsed = self.opened_at.map(|at| at.elapsed()).unwrap_or(Duration::ZERO);
                if elapsed >= self.open_duration {
                    self.state = BreakerState::HalfOpen;
                    info!("circuit breaker: Open -> HalfOpen, attempting probe");
                    Admission::Probe
                } else {
                    Admission::Reject
                }
            }
            BreakerState::HalfOpen => Admission::Probe,
        }
    }

    pub fn record_success(&mut self) {
        if self.state != BreakerState::Closed {
            info!("circuit breaker: -> Closed (probe succeeded)");
        }
        self.state = BreakerState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    pub fn record_failure(&mut self) {
        match self.state {
            BreakerState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.state = BreakerState::Open;
                    self.opened_at = Some(Instant::now());
                    warn!(
                        consecutive_failures = self.consecutive_failures,
                        "circuit breaker: Open, pausing submissions for {:?}", self.open_duration
                    );
                }
            }
            BreakerState::HalfOpen => {
                self.state = BreakerState::Open;
                self.opened_at = Some(Instant::now());
                warn!("circuit breaker: probe failed, HalfOpen -> Open");
            }
            BreakerState::Open => {}
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_open(&self) -> bool {
        self.state == BreakerState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_under_threshold() {
        let mut cb = CircuitBreaker::new(10, 60_000);
        for _ in 0..9 {
            cb.record_failure();
            assert_eq!(cb.admit(), Admission::Allow);
        }
        assert!(!cb.is_open());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let mut cb = CircuitBreaker::new(10, 60_000);
        for _ in 0..10 {
            cb.record_failure();
        }
        assert!(cb.is_open());
        assert_eq!(cb.admit(), Admission::Reject);
    }

    #[test]
    fn half_open_probe_closes_on_success() {
        let mut cb = CircuitBreaker::new(1, 0);
        cb.record_failure();
        assert!(cb.is_open());
        // open_duration_ms = 0, so the cooldown has already elapsed.
        assert_eq!(cb.admit(), Admission::Probe);
        cb.record_success();
        assert!(!cb.is_open());
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn half_open_probe_reopens_on_failure() {
        let mut cb = CircuitBreaker::new(1, 0);
        cb.record_failure();
        assert_eq!(cb.admit(), Admission::Probe);
        cb.record_failure();
        assert!(cb.is_open());
    }
}
