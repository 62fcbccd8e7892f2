//! 编排模块：指纹、缓存、凭证解析与重试执行的统一入口。
//!
//! # Orchestrator Module
//!
//! Composes the cache, vault, retry executor, and usage meter around one
//! generic "invoke remote task" operation:
//!
//! 1. Fingerprint the operation name and normalized parameters.
//! 2. Probe the cache (hits are returned immediately and still metered).
//! 3. Resolve a credential by priority; fail fast before any network use.
//! 4. Execute the task under the retry policy, with an optional caller
//!    timeout mapped to a transient failure.
//! 5. Record usage and populate the cache on success only.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ai_relay::{InvokeOptions, OrchestratorBuilder, Params};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> ai_relay::Result<()> {
//!     let orchestrator = OrchestratorBuilder::new().build()?;
//!     let mut params = Params::new();
//!     params.insert("prompt".into(), json!("Summarize this document"));
//!
//!     let options = InvokeOptions::new("openai").with_model("gpt-4o-mini");
//!     let result: Value = orchestrator
//!         .invoke("generate", &params, |_credential| async move {
//!             // call the provider here and return its response
//!             Ok(json!({"text": "..."}))
//!         }, &options)
//!         .await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! Concurrent identical requests are not deduplicated: two callers missing
//! the cache on the same fingerprint both execute the remote task, and the
//! later completion overwrites an identical cache entry.

use crate::cache::{CacheConfig, CacheManager, Fingerprinter, MemoryCache, Params};
use crate::config::RelayConfig;
use crate::retry::{ErrorClassifier, RetryExecutor, RetryPolicy, StatusClassifier};
use crate::usage::{PricingTable, UsageMeter};
use crate::vault::CredentialVault;
use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Per-call knobs. Caching is on by default; the TTL, retry policy, and
/// timeout fall back to orchestrator-level defaults when unset.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    pub provider: String,
    pub model: Option<String>,
    pub cacheable: bool,
    pub ttl: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
    pub timeout: Option<Duration>,
}

impl InvokeOptions {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            cacheable: true,
            ttl: None,
            retry_policy: None,
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn uncacheable(self) -> Self {
        self.with_cacheable(false)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct Orchestrator {
    cache: Arc<CacheManager>,
    vault: Arc<CredentialVault>,
    meter: Arc<UsageMeter>,
    fingerprinter: Fingerprinter,
    classifier: Arc<dyn ErrorClassifier>,
    pricing: PricingTable,
    default_policy: RetryPolicy,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub async fn invoke<T, F, Fut>(
        &self,
        operation: &str,
        params: &Params,
        task: F,
        options: &InvokeOptions,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
    {
        let key = self
            .fingerprinter
            .fingerprint(operation, params)
            .with_provider(&options.provider);
        let request_id = Uuid::new_v4().to_string();
        let input_text = serde_json::to_string(params).unwrap_or_default();

        if options.cacheable {
            if let Some(value) = self.cache.get::<T>(&key).await {
                let output_text = serde_json::to_string(&value).unwrap_or_default();
                self.meter.record_usage(
                    &request_id,
                    &input_text,
                    &output_text,
                    options.model.as_deref(),
                    &self.pricing,
                    true,
                );
                debug!(%key, %request_id, "cache hit");
                return Ok(value);
            }
        }

        let credential = self.vault.resolve_credential(&options.provider)?;

        let policy = options
            .retry_policy
            .clone()
            .unwrap_or_else(|| self.default_policy.clone());
        let executor = RetryExecutor::with_classifier(policy, self.classifier.clone());
        let timeout = options.timeout;

        let result = executor
            .execute(|_attempt| {
                let fut = task(credential.clone());
                async move {
                    match timeout {
                        Some(limit) => match tokio::time::timeout(limit, fut).await {
                            Ok(inner) => inner,
                            Err(_) => Err(Error::Timeout {
                                elapsed_ms: limit.as_millis() as u64,
                            }),
                        },
                        None => fut.await,
                    }
                }
            })
            .await;

        match result {
            Ok(value) => {
                let output_text = serde_json::to_string(&value).unwrap_or_default();
                self.meter.record_usage(
                    &request_id,
                    &input_text,
                    &output_text,
                    options.model.as_deref(),
                    &self.pricing,
                    false,
                );
                if options.cacheable {
                    match options.ttl {
                        Some(ttl) => self.cache.set_with_ttl(&key, &value, ttl).await,
                        None => self.cache.set(&key, &value).await,
                    }
                }
                Ok(value)
            }
            // failures are never cached; messages are scrubbed of the credential
            Err(err) => Err(err.redact(&credential)),
        }
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }
    pub fn vault(&self) -> &Arc<CredentialVault> {
        &self.vault
    }
    pub fn meter(&self) -> &Arc<UsageMeter> {
        &self.meter
    }
}

/// Builds an [`Orchestrator`] with constructor-injected components so tests
/// can swap in fakes. Defaults: in-memory cache (100 entries, 5-minute
/// TTL), in-memory vault, character-based metering, status classification,
/// and the stock retry policy. Use [`OrchestratorBuilder::from_config`] for
/// a durable vault.
pub struct OrchestratorBuilder {
    cache: Option<Arc<CacheManager>>,
    vault: Option<Arc<CredentialVault>>,
    meter: Option<Arc<UsageMeter>>,
    fingerprinter: Option<Fingerprinter>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
    pricing: Option<PricingTable>,
    retry_policy: Option<RetryPolicy>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            cache: None,
            vault: None,
            meter: None,
            fingerprinter: None,
            classifier: None,
            pricing: None,
            retry_policy: None,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let cache = CacheManager::new(
            config.cache_config(),
            Box::new(MemoryCache::new(config.cache.capacity)),
        );
        let vault = CredentialVault::open(&config.vault.path)?;
        let meter = UsageMeter::new().with_capacity(config.usage.log_capacity);
        Ok(Self::new()
            .with_cache(Arc::new(cache))
            .with_vault(Arc::new(vault))
            .with_meter(Arc::new(meter))
            .with_retry_policy(config.retry_policy()))
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_vault(mut self, vault: Arc<CredentialVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_meter(mut self, meter: Arc<UsageMeter>) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Fingerprinter) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let cache = match self.cache {
            Some(cache) => cache,
            None => Arc::new(CacheManager::new(
                CacheConfig::default(),
                Box::new(MemoryCache::default()),
            )),
        };
        let vault = match self.vault {
            Some(vault) => vault,
            None => Arc::new(CredentialVault::in_memory()?),
        };
        Ok(Orchestrator {
            cache,
            vault,
            meter: self.meter.unwrap_or_else(|| Arc::new(UsageMeter::new())),
            fingerprinter: self.fingerprinter.unwrap_or_default(),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(StatusClassifier)),
            pricing: self.pricing.unwrap_or_else(PricingTable::with_defaults),
            default_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
