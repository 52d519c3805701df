//! The retry-after hint returned with every notification poll.
//!
//! Clients back off along a linear ramp keyed to process uptime: polls are cheap right after start (when the
//! benchmark of traffic is warming up) and settle at the ceiling once the process has been up for the ramp
//! duration.
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const FIRST_RETRY_AFTER_MS: u64 = 60;
const LAST_RETRY_AFTER_MS: u64 = 1500;
const RAMP: Duration = Duration::from_secs(60);

/// Computes the `retry_after_ms` hint from wall-clock time since process start (or the last [`reset`](Self::reset)).
pub struct RetryAfterPolicy {
    started: Mutex<Instant>,
}

impl Default for RetryAfterPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryAfterPolicy {
    pub fn new() -> Self {
        Self { started: Mutex::new(Instant::now()) }
    }

    /// Restarts the ramp. Called when the service is (re)initialized.
    pub fn reset(&self) {
        *self.started.lock() = Instant::now();
    }

    pub fn retry_after_ms(&self) -> u64 {
        ramp_value(self.started.lock().elapsed())
    }
}

fn ramp_value(elapsed: Duration) -> u64 {
    let elapsed = elapsed.min(RAMP);
    FIRST_RETRY_AFTER_MS + (LAST_RETRY_AFTER_MS - FIRST_RETRY_AFTER_MS) * elapsed.as_secs() / RAMP.as_secs()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ramp_starts_at_the_floor() {
        assert_eq!(ramp_value(Duration::ZERO), 60);
    }

    #[test]
    fn ramp_is_linear() {
        assert_eq!(ramp_value(Duration::from_secs(30)), 60 + (1500 - 60) / 2);
    }

    #[test]
    fn ramp_clamps_at_the_ceiling() {
        assert_eq!(ramp_value(Duration::from_secs(60)), 1500);
        assert_eq!(ramp_value(Duration::from_secs(3600)), 1500);
    }

    #[test]
    fn reset_restarts_the_ramp() {
        let policy = RetryAfterPolicy::new();
        policy.reset();
        assert_eq!(policy.retry_after_ms(), 60);
    }
}
