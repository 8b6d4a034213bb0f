//! Polling budget for reasoning jobs.
//!
//! Delay between status checks grows exponentially and is capped:
//! `min(initial * 2^min(checks - 1, max_exponent), max_interval)`.

use std::time::Duration;

use ideaforge_core::config::PollSettings;

/// Bounds how long and how often a job is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_exponent: u32,
    /// Maximum number of status checks; unbounded when `None`.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget for a whole job, submission included.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollSettings::default())
    }
}

impl From<&PollSettings> for PollPolicy {
    fn from(settings: &PollSettings) -> Self {
        Self {
            initial_interval: Duration::from_millis(settings.initial_interval_ms),
            max_interval: Duration::from_millis(settings.max_interval_ms.max(settings.initial_interval_ms)),
            max_exponent: settings.max_exponent,
            max_attempts: settings.max_attempts,
            deadline: Duration::from_secs(settings.deadline_secs),
        }
    }
}

impl PollPolicy {
    /// A policy polling at a constant interval.
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            max_exponent: 0,
            max_attempts: None,
            deadline,
        }
    }

    /// Caps the number of status checks.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay to wait after `checks` status checks have been made.
    pub fn delay_after(&self, checks: u32) -> Duration {
        let exponent = checks.saturating_sub(1).min(self.max_exponent);
        let multiplier = 2u32.saturating_pow(exponent);
        self.initial_interval
            .saturating_mul(multiplier)
            .min(self.max_interval)
    }

    /// Whether `checks` status checks use up the attempt budget.
    pub fn attempts_exhausted(&self, checks: u32) -> bool {
        self.max_attempts.is_some_and(|max| checks >= max)
    }
}
