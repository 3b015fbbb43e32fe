//! Best-effort cache facade used by every call site.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::backend::{CacheBackend, MemoryCacheBackend};
use super::error::CacheResult;
use super::types::CacheNamespace;
use crate::config::CacheConfig;
use crate::constants::SERVICE_CACHE;

/// Namespaced, TTL-aware cache that never fails its caller.
///
/// A store without a backend is a legal "disabled" state: reads miss, writes are dropped.
/// Backend errors are logged and treated the same way. Concurrent writers to one key race;
/// the last write wins.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    config: CacheConfig,
}

impl CacheStore {
    /// Store over an explicit backend.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            config,
        }
    }

    /// Store with the in-process backend, or disabled if `config.enabled` is false.
    pub fn from_config(config: CacheConfig) -> Self {
        if !config.enabled {
            debug!("Cache disabled by configuration");
            return Self::disabled_with(config);
        }
        Self::new(
            Arc::new(MemoryCacheBackend::with_capacity(config.capacity)),
            config,
        )
    }

    /// Store that caches nothing.
    pub fn disabled() -> Self {
        Self::disabled_with(CacheConfig::default())
    }

    fn disabled_with(config: CacheConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// TTL for a namespace.
    #[inline]
    pub fn ttl(&self, namespace: CacheNamespace) -> Duration {
        namespace.ttl(&self.config)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key).await {
            Ok(hit) => {
                debug!(key = key, hit = hit.is_some(), "Cache lookup");
                hit
            }
            Err(e) => {
                warn!(
                    service = SERVICE_CACHE,
                    key = key,
                    error = %e,
                    category = %e.category(),
                    "Cache get failed, treating as miss"
                );
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.set(key, value, ttl).await {
            warn!(
                service = SERVICE_CACHE,
                key = key,
                error = %e,
                "Cache set failed, value not cached"
            );
        }
    }

    /// Removes one key; returns `true` if it existed.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        match backend.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(key = key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    /// Removes every key matching `pattern`; returns how many were removed.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let Some(backend) = self.backend.as_ref() else {
            return 0;
        };
        let keys = match backend.scan(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(
                    service = SERVICE_CACHE,
                    pattern = pattern,
                    error = %e,
                    "Cache scan failed, nothing invalidated"
                );
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            if self.delete(&key).await {
                removed += 1;
            }
        }
        debug!(pattern = pattern, removed = removed, "Cache pattern invalidated");
        removed
    }

    /// Reads and deserializes a JSON value; undecodable payloads count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match decode_json(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    service = SERVICE_CACHE,
                    key = key,
                    error = %e,
                    category = %e.category(),
                    "Discarding undecodable cache payload"
                );
                self.delete(key).await;
                None
            }
        }
    }

    /// Serializes `value` as JSON and stores it under the namespace TTL.
    pub async fn set_json<T: Serialize>(&self, namespace: CacheNamespace, key: &str, value: &T) {
        if !self.is_enabled() {
            return;
        }
        match encode_json(value) {
            Ok(raw) => self.set(key, raw, self.ttl(namespace)).await,
            Err(e) => warn!(
                service = SERVICE_CACHE,
                key = key,
                error = %e,
                category = %e.category(),
                "Cache payload serialization failed"
            ),
        }
    }
}

/// Decodes a JSON cache payload.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> CacheResult<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Encodes a value as a JSON cache payload.
pub fn encode_json<T: Serialize>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish()
    }
}
