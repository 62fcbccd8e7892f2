//! Retry policy and backoff schedule.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with a hard delay cap and optional jitter.
///
/// `max_attempts` counts the first attempt, so the default of 3 means at
/// most 2 retries. Provider-supplied `Retry-After` hints override the
/// computed base delay but are still capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Jitter fraction in `0.0..=1.0`; the delay varies by ± this share.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1200),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn no_jitter(self) -> Self {
        self.with_jitter(0.0)
    }

    /// Delay to sleep after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let cap = self.max_delay.as_millis() as f64;
        let base = (self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent)).min(cap);
        let chosen = match retry_after_ms {
            Some(hint) => (hint as f64).min(cap),
            None => base,
        };
        let jittered = if self.jitter > 0.0 && chosen > 0.0 {
            let spread = chosen * self.jitter;
            let offset = rand::thread_rng().gen_range(-spread..=spread);
            (chosen + offset).max(0.0)
        } else {
            chosen
        };
        Duration::from_millis(jittered as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(10_000))
            .no_jitter();
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3, None), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(5, None), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(30, None), Duration::from_millis(10_000));
    }

    #[test]
    fn retry_after_hint_overrides_base_but_not_cap() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(10_000))
            .no_jitter();
        assert_eq!(policy.delay_for(1, Some(3000)), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(1, Some(60_000)), Duration::from_millis(10_000));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(1000))
            .with_jitter(0.1);
        for _ in 0..50 {
            let d = policy.delay_for(1, None).as_millis() as i64;
            assert!((900..=1100).contains(&d), "delay {d} outside jitter band");
        }
    }

    #[test]
    fn attempts_clamp_to_at_least_one() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts, 1);
    }
}
