//! 响应缓存模块：请求指纹与带 TTL 的有界 LRU 缓存。
//!
//! # Response Caching Module
//!
//! This module makes repeated remote invocations cheap: equivalent requests
//! collapse onto one deterministic fingerprint, and completed responses are
//! held in a bounded in-memory store until their time-to-live elapses.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Fingerprinter`] | Order-independent request fingerprinting (SHA-256) |
//! | [`Fingerprint`] | Cache key newtype with operation/provider labels |
//! | [`CacheManager`] | Typed facade with TTL defaults and hit/miss statistics |
//! | [`CacheConfig`] | TTL, capacity gating, and entry-size limits |
//! | [`CacheBackend`] | Trait for pluggable storage backends |
//! | [`MemoryCache`] | In-memory LRU backend with lazy expiry |
//! | [`NullCache`] | No-op backend for disabling caching |
//!
//! ## Example
//!
//! ```rust
//! use ai_relay::cache::{CacheConfig, CacheManager, MemoryCache};
//! use std::time::Duration;
//!
//! let config = CacheConfig::new().with_ttl(Duration::from_secs(300));
//! let cache = CacheManager::new(config, Box::new(MemoryCache::new(100)));
//! ```
//!
//! The cache is advisory by contract: any internal fault is logged and
//! reported as a miss, and entries are only ever written after a fully
//! successful remote completion.

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{Fingerprint, Fingerprinter, Params};
pub use manager::{CacheConfig, CacheManager, CacheStats};
