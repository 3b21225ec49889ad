//! Reconnect backoff policy
//!
//! The system this crate descends from retried a dropped connection every
//! three seconds, forever. Unbounded constant-delay retries hammer a failing
//! or rate-limiting remote, so the policy here backs off exponentially from
//! that same three-second base and stops after a bounded number of attempts.
//! `max_attempts: None` restores the unbounded behavior for callers that
//! want it.

use std::time::Duration;

/// Policy controlling deferred reconnect attempts after a transient close
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt
    pub base_delay: Duration,
    /// Upper bound for exponential delay growth
    pub max_delay: Duration,
    /// Maximum consecutive attempts before giving up; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Computes the delay to apply before the given attempt
    ///
    /// `attempt` is 1-based; the first attempt waits exactly `base_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let mut delay = self.base_delay;
        for _ in 1..attempt {
            delay = std::cmp::min(delay.saturating_mul(2), self.max_delay);
        }
        delay
    }

    /// Whether the given 1-based attempt exceeds the attempt ceiling
    #[must_use]
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt > max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(60),
            max_attempts: Some(10),
        }
    }
}
