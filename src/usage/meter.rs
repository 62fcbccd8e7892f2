//! Session usage log and running totals.

use super::estimator::{CharacterEstimator, TokenEstimator};
use super::pricing::PricingTable;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub request_id: String,
    pub model: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost_usd: f64,
    pub timestamp_ms: u64,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    pub request_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_usd: f64,
}

/// Session-scoped usage accounting. The log is bounded (oldest dropped
/// first) and lives only for the process lifetime; recording failures are
/// logged and never block the primary result.
pub struct UsageMeter {
    estimator: Box<dyn TokenEstimator>,
    records: Mutex<VecDeque<UsageRecord>>,
    capacity: usize,
}

impl UsageMeter {
    /// Default bound on the session log.
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_estimator(Box::new(CharacterEstimator::new()))
    }

    pub fn with_estimator(estimator: Box<dyn TokenEstimator>) -> Self {
        Self {
            estimator,
            records: Mutex::new(VecDeque::new()),
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn estimate_tokens(&self, text: &str) -> u32 {
        self.estimator.estimate(text)
    }

    /// Cache hits are recorded with their real token estimates but zero
    /// remote cost, so request accounting stays accurate.
    pub fn record_usage(
        &self,
        request_id: &str,
        input_text: &str,
        output_text: &str,
        model: Option<&str>,
        pricing: &PricingTable,
        cache_hit: bool,
    ) -> UsageRecord {
        let input_tokens = self.estimator.estimate(input_text);
        let output_tokens = self.estimator.estimate(output_text);
        let estimated_cost_usd = if cache_hit {
            0.0
        } else {
            match model.and_then(|m| pricing.for_model(m)) {
                Some(p) => p.calculate_cost(input_tokens, output_tokens).total_cost,
                None => {
                    if let Some(m) = model {
                        debug!(model = m, "no pricing entry, recording zero cost");
                    }
                    0.0
                }
            }
        };

        let record = UsageRecord {
            request_id: request_id.to_string(),
            model: model.map(|m| m.to_string()),
            input_tokens,
            output_tokens,
            estimated_cost_usd,
            timestamp_ms: epoch_millis(),
            cache_hit,
        };

        match self.records.lock() {
            Ok(mut log) => {
                while log.len() >= self.capacity {
                    log.pop_front();
                }
                log.push_back(record.clone());
            }
            Err(_) => warn!(request_id, "usage log unavailable, record dropped"),
        }
        record
    }

    pub fn session_totals(&self) -> SessionTotals {
        match self.records.lock() {
            Ok(log) => log.iter().fold(SessionTotals::default(), |mut acc, r| {
                acc.request_count += 1;
                acc.total_input_tokens += u64::from(r.input_tokens);
                acc.total_output_tokens += u64::from(r.output_tokens);
                acc.total_cost_usd += r.estimated_cost_usd;
                acc
            }),
            Err(_) => {
                warn!("usage log unavailable, totals empty");
                SessionTotals::default()
            }
        }
    }

    /// Most recent records, newest last.
    pub fn recent(&self, n: usize) -> Vec<UsageRecord> {
        match self.records.lock() {
            Ok(log) => log.iter().rev().take(n).rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Explicit session reset; nothing else clears the log.
    pub fn reset(&self) {
        if let Ok(mut log) = self.records.lock() {
            log.clear();
        }
    }
}

impl Default for UsageMeter {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
