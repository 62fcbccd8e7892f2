//! # ai-relay
//!
//! 这是一个客户端侧的请求编排运行时，让对限流生成式 AI 服务的重复调用
//! 变得低成本、可恢复且可核算。
//!
//! Client-side request orchestration runtime for rate-limited generative-AI
//! services: it makes repeated, possibly-expensive remote calls cheap,
//! resilient, and cost-accountable without the caller needing to know about
//! network failure modes.
//!
//! ## Overview
//!
//! Every call flows one way through the same pipeline: fingerprint the
//! request, probe the response cache, resolve a credential, execute the
//! remote task under a classifying retry policy, meter the usage, and
//! populate the cache. The remote provider itself stays behind a small
//! task boundary — any closure that surfaces failures with a status code
//! and message plugs in.
//!
//! ## Key Features
//!
//! - **Deterministic fingerprinting**: equivalent requests collapse onto
//!   one cache key regardless of parameter order or prompt whitespace
//! - **Bounded response cache**: LRU with per-entry TTL, advisory by
//!   contract (faults degrade to misses, never block the caller)
//! - **Classifying retries**: rate-limit and transient-server failures
//!   back off exponentially with jitter; client faults fail immediately
//! - **Sealed credential vault**: local durable storage, authenticated
//!   sealing, masked display, vault-then-environment resolution
//! - **Usage metering**: token estimates, per-model pricing, session
//!   totals with cache hits recorded at zero remote cost
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_relay::{InvokeOptions, OrchestratorBuilder, Params};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> ai_relay::Result<()> {
//!     let orchestrator = OrchestratorBuilder::new().build()?;
//!     orchestrator.vault().set_credential("openai", "sk-...")?;
//!
//!     let mut params = Params::new();
//!     params.insert("prompt".into(), json!("Draft a project update"));
//!
//!     let options = InvokeOptions::new("openai").with_model("gpt-4o-mini");
//!     let response: Value = orchestrator
//!         .invoke("generate", &params, |_credential| async move {
//!             // provider call goes here
//!             Ok(json!({"text": "..."}))
//!         }, &options)
//!         .await?;
//!
//!     println!("{response}");
//!     println!("session: {:?}", orchestrator.meter().session_totals());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`orchestrator`] | The `invoke` pipeline composing everything below |
//! | [`cache`] | Request fingerprinting and the bounded TTL/LRU cache |
//! | [`retry`] | Failure classification and the backoff executor |
//! | [`vault`] | Sealed credential storage and resolution |
//! | [`usage`] | Token estimation, pricing, session accounting |
//! | [`transport`] | HTTP adapter for the remote-task boundary |
//! | [`config`] | YAML-loadable runtime settings |

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod retry;
pub mod transport;
pub mod usage;
pub mod vault;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheManager, CacheStats, Fingerprint, Fingerprinter, MemoryCache, Params};
pub use config::RelayConfig;
pub use orchestrator::{InvokeOptions, Orchestrator, OrchestratorBuilder};
pub use retry::{ErrorClass, ErrorClassifier, RetryExecutor, RetryPolicy};
pub use usage::{ModelPricing, PricingTable, SessionTotals, UsageMeter, UsageRecord};
pub use vault::CredentialVault;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
