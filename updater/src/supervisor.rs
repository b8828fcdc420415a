//! Relay liveness supervisor (§4.4): if no `Heartbeat` or `PriceUpdate` is
//! observed for 30 s (checked every 10 s), the relay is killed and
//! restarted after a 2 s wait. Five consecutive restart failures within a
//! sliding window are fatal.
//!
//! A plain state machine over `Instant`, grounded on the same
//! `start_blockhash_refresh`/`start_transaction_monitor` periodic-check
//! shape `SolanaTransactionManager` uses, generalized from a fixed-interval
//! refresh to a liveness timeout plus restart budget.

use std::time::{Duration, Instant};

use tracing::{error, warn};

const LIVENESS_TIMEOUT: Duration = Duration::from_secs(30);
pub const RESTART_GRACE: Duration = Duration::from_secs(2);
const RESTART_FAILURE_LIMIT: u32 = 5;
/// Sliding window over which consecutive restart failures are counted; a
/// successful period of activity resets the counter.
const RESTART_WINDOW: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ok,
    Restart,
    Fatal,
}

pub struct RestartSupervisor {
    last_activity: Instant,
    restart_failures: u32,
    window_start: Option<Instant>,
}

impl RestartSupervisor {
    pub fn new(now: Instant) -> Self {
        Self { last_activity: now, restart_failures: 0, window_start: None }
    }

    /// Call on every `Heartbeat`/`PriceUpdate` observed from the relay.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = now;
        self.restart_failures = 0;
        self.window_start = None;
    }

    /// Call every 10 s. Returns whether the relay should be restarted
    /// (`Restart`) or the controller should give up (`Fatal`).
    pub fn check(&mut self, now: Instant) -> Action {
        if now.duration_since(self.last_activity) < LIVENESS_TIMEOUT {
            return Action::Ok;
        }

        if let Some(window_start) = self.window_start {
            if now.duration_since(window_start) > RESTART_WINDOW {
                // window expired without reaching the fatal threshold; start fresh.
                self.window_start = Some(now);
                self.restart_failures = 0;
            }
        } else {
            self.window_start = Some(now);
        }

        self.restart_failures += 1;
        warn!(restart_failures = self.restart_failures, "relay liveness timeout, restarting");

        if self.restart_failures >= RESTART_FAILURE_LIMIT {
            error!(restart_failures = self.restart_failures, "relay restart budget exhausted, fatal");
            return Action::Fatal;
        }

        // reset the clock so a restarted-but-still-dead relay gets another
        // full timeout window before the next restart attempt.
        self.last_activity = now;
        Action::Restart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_ok_within_timeout() {
        let start = Instant::now();
        let mut sup = RestartSupervisor::new(start);
        assert_eq!(sup.check(start + Duration::from_secs(10)), Action::Ok);
    }

    #[test]
    fn restarts_after_timeout_then_recovers() {
        let start = Instant::now();
        let mut sup = RestartSupervisor::new(start);
        assert_eq!(sup.check(start + Duration::from_secs(31)), Action::Restart);
        sup.record_activity(start + Duration::from_secs(32));
        assert_eq!(sup.check(start + Duration::from_secs(40)), Action::Ok);
    }

    #[test]
    fn fatal_after_five_consecutive_restart_failures() {
        let start = Instant::now();
        let mut sup = RestartSupervisor::new(start);
        let mut t = start;
        for i in 0..4 {
            t += Duration::from_secs(31);
            assert_eq!(sup.check(t), Action::Restart, "iteration {i}");
        }
        t += Duration::from_secs(31);
        assert_eq!(sup.check(t), Action::Fatal);
    }
}
