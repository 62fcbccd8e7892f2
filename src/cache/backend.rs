//! Cache backend implementations.

use super::key::Fingerprint;
use crate::{Error, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    data: Vec<u8>,
    created_at: Instant,
    ttl: Duration,
    hit_count: u64,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
            hit_count: 0,
        }
    }
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &Fingerprint) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &Fingerprint, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &Fingerprint) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    /// Capacity evictions performed so far. Lazy TTL removals are not counted.
    fn evictions(&self) -> u64 {
        0
    }
    fn name(&self) -> &'static str;
}

/// In-memory LRU store with per-entry TTL. Recency is updated on both reads
/// and writes; expired entries are purged lazily on access.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    evicted: AtomicU64,
}

impl MemoryCache {
    /// Default capacity used by the orchestration layer.
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            evicted: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Cache("memory cache lock poisoned".into()))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &Fingerprint) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get_mut(&key.hash) {
            if entry.is_expired() {
                entries.pop(&key.hash);
                return Ok(None);
            }
            entry.hit_count += 1;
            return Ok(Some(entry.data.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &Fingerprint, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.len() == usize::from(entries.cap()) && !entries.contains(&key.hash) {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        entries.put(key.hash.clone(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &Fingerprint) -> Result<bool> {
        Ok(self.lock()?.pop(&key.hash).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.lock()?.iter().filter(|(_, e)| !e.is_expired()).count())
    }

    fn evictions(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op backend for disabling caching without touching call sites.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &Fingerprint) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &Fingerprint, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &Fingerprint) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
