//! Runtime configuration.
//!
//! Settings for the cache, retry policy, vault, and usage log, loadable
//! from a YAML file with environment overrides. Everything has a sensible
//! default so zero-config construction works.

use crate::cache::CacheConfig;
use crate::retry::RetryPolicy;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at a YAML config file.
pub const CONFIG_PATH_ENV: &str = "AI_RELAY_CONFIG";
/// Environment override for the vault database path.
pub const VAULT_PATH_ENV: &str = "AI_RELAY_VAULT_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub vault: VaultSettings,
    #[serde(default)]
    pub usage: UsageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_ms: default_cache_ttl_ms(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    #[serde(default = "default_vault_path")]
    pub path: PathBuf,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSettings {
    #[serde(default = "default_usage_capacity")]
    pub log_capacity: usize,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            log_capacity: default_usage_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    100
}
fn default_cache_ttl_ms() -> u64 {
    300_000
}
fn default_true() -> bool {
    true
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    1200
}
fn default_max_delay_ms() -> u64 {
    10_000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_jitter() -> f64 {
    0.1
}
fn default_vault_path() -> PathBuf {
    PathBuf::from("ai-relay-vault.db")
}
fn default_usage_capacity() -> usize {
    1000
}

impl RelayConfig {
    pub fn from_yaml_file(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RelayConfig = serde_yaml::from_str(&text).map_err(|e| {
            Error::configuration(format!("invalid config file {}: {e}", path.display()))
        })?;
        Ok(config.with_env_overrides())
    }

    /// `AI_RELAY_CONFIG` file when set, defaults otherwise.
    pub fn from_env_or_default() -> crate::Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(Path::new(&path)),
            Err(_) => Ok(Self::default().with_env_overrides()),
        }
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(VAULT_PATH_ENV) {
            if !path.is_empty() {
                self.vault.path = PathBuf::from(path);
            }
        }
        self
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_ttl(Duration::from_millis(self.cache.ttl_ms))
            .with_enabled(self.cache.enabled)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.retry.max_attempts)
            .with_initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.retry.max_delay_ms))
            .with_backoff_multiplier(self.retry.backoff_multiplier)
            .with_jitter(self.retry.jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.cache.ttl_ms, 300_000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.usage.log_capacity, 1000);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "cache:\n  capacity: 10\nretry:\n  max_attempts: 5\n";
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.cache.ttl_ms, 300_000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.max_delay_ms, 10_000);
    }

    #[test]
    fn retry_policy_is_derived_from_settings() {
        let yaml = "retry:\n  initial_delay_ms: 500\n  jitter: 0.0\n";
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.jitter, 0.0);
    }
}
