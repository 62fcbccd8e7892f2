//! Attempt loop: classify, back off, re-attempt or fail.

use super::classify::{ErrorClass, ErrorClassifier, StatusClassifier};
use super::policy::RetryPolicy;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives a fallible remote task through `Attempting(1..=max)` until it
/// succeeds or terminally fails. Non-retryable failures exit on the first
/// attempt with the original error; retryable failures that exhaust the
/// policy are re-surfaced annotated as such. The backoff sleep is a
/// cooperative suspension point; no component lock is held across it.
pub struct RetryExecutor {
    policy: RetryPolicy,
    classifier: Arc<dyn ErrorClassifier>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_classifier(policy, Arc::new(StatusClassifier))
    }

    pub fn with_classifier(policy: RetryPolicy, classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self { policy, classifier }
    }

    pub async fn execute<T, F, Fut>(&self, mut task: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match task(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "remote task succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let class = self.classifier.classify(&err);
                    if !class.is_retryable() {
                        debug!(attempt, error = %err, "non-retryable failure");
                        return Err(err);
                    }
                    if attempt >= max_attempts {
                        warn!(attempt, error = %err, "retries exhausted");
                        return Err(exhausted(err, class, max_attempts));
                    }
                    let delay = self.policy.delay_for(attempt, err.retry_after_ms());
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn exhausted(err: Error, class: ErrorClass, attempts: u32) -> Error {
    if matches!(err, Error::Timeout { .. }) {
        return err;
    }
    match class {
        ErrorClass::RateLimited => Error::RateLimited {
            status: err.status().unwrap_or(429),
            message: format!(
                "provider under high load, please retry later (retries exhausted after {attempts} attempts): {err}"
            ),
            retry_after_ms: err.retry_after_ms(),
        },
        _ => Error::TransientServer {
            status: err.status().unwrap_or(503),
            message: format!("retries exhausted after {attempts} attempts: {err}"),
        },
    }
}
