//! Cache backends.
//!
//! [`MemoryCacheBackend`] keeps entries in-process with per-entry expiry. Remote stores
//! implement [`CacheBackend`] and are plugged into [`CacheStore`](super::CacheStore).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use moka::Expiry;
use moka::sync::Cache;

use super::error::{CacheError, CacheResult};

#[async_trait]
/// Generic string key/value backend.
pub trait CacheBackend: Send + Sync {
    /// Returns the live value for `key`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// Stores `value` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;
    /// Removes `key`; returns `true` if it was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
    /// Lists keys matching a glob `pattern`.
    async fn scan(&self, pattern: &str) -> CacheResult<Vec<String>>;
}

/// Compiles a key glob (`*`, `?`, `[...]`).
pub fn compile_pattern(pattern: &str) -> CacheResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

#[derive(Debug, Clone)]
struct StoredValue {
    payload: String,
    ttl: Duration,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend (moka) with per-entry TTL and capacity-bounded eviction.
pub struct MemoryCacheBackend {
    entries: Cache<String, StoredValue>,
}

impl MemoryCacheBackend {
    const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Approximate number of stored entries.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheBackend")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self.entries.get(key) {
            Some(value) if value.is_expired() => {
                self.entries.invalidate(key);
                Ok(None)
            }
            Some(value) => Ok(Some(value.payload)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let stored = StoredValue {
            payload: value,
            ttl,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn scan(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = compile_pattern(pattern)?;
        Ok(self
            .entries
            .iter()
            .filter(|(_, value)| !value.is_expired())
            .filter(|(key, _)| matcher.is_match(key.as_str()))
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }
}
