//! Typed cache facade with TTL defaults and statistics.

use super::backend::CacheBackend;
use super::key::Fingerprint;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub enabled: bool,
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            enabled: true,
            max_entry_size: 1024 * 1024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache access is advisory: every internal fault degrades to a miss and a
/// warning, never an error to the caller.
pub struct CacheManager {
    config: CacheConfig,
    backend: Box<dyn CacheBackend>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &Fingerprint) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        match self.backend.get(key).await {
            Ok(Some(data)) => match serde_json::from_slice(&data) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    warn!(%key, error = %e, "cached payload undecodable, treating as miss");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "cache backend fault on get, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &Fingerprint, value: &T) {
        self.set_with_ttl(key, value, self.config.default_ttl).await
    }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &Fingerprint, value: &T, ttl: Duration) {
        if !self.config.enabled {
            return;
        }
        let data = match serde_json::to_vec(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(%key, error = %e, "value not serializable, skipping cache write");
                return;
            }
        };
        if data.len() > self.config.max_entry_size {
            warn!(%key, size = data.len(), "entry exceeds max size, skipping cache write");
            return;
        }
        if let Err(e) = self.backend.set(key, &data, ttl).await {
            warn!(%key, error = %e, "cache backend fault on set, entry dropped");
        }
    }

    pub async fn invalidate(&self, key: &Fingerprint) -> bool {
        match self.backend.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(%key, error = %e, "cache backend fault on delete");
                false
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            warn!(error = %e, "cache backend fault on clear");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.backend.evictions(),
            size: self.backend.len().await.unwrap_or(0),
        }
    }

    /// Counters survive `clear()`; only this resets them.
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
