// src/cache.rs

//! Namespaced TTL cache over fetch+extract results.
//!
//! Values are serialized JSON so a cached "known-empty" result (an empty
//! list) stays distinguishable from absence and suppresses re-fetching
//! for its TTL. Concurrent writers race benignly; every value is derived
//! deterministically from the same external source, so last write wins.
//! Cache trouble degrades to a live fetch and is never fatal.

use std::time::{Duration, Instant};

use moka::Expiry;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::CacheConfig;

/// Cache key builders, one namespace per record type.
pub mod keys {
    /// Current platform status snapshot.
    pub fn status() -> String {
        "status".to_string()
    }

    /// Organization profile.
    pub fn org(sid: &str) -> String {
        format!("org:{}", sid.to_lowercase())
    }

    /// Full synced roster for an organization.
    pub fn roster(sid: &str) -> String {
        format!("roster:{}", sid.to_lowercase())
    }

    /// One roster page for an organization.
    pub fn roster_page(sid: &str, page: usize) -> String {
        format!("roster:{}:page:{}", sid.to_lowercase(), page)
    }

    /// User profile, keyed case-insensitively.
    pub fn user(handle: &str) -> String {
        format!("user:{}", handle.to_lowercase())
    }
}

#[derive(Debug, Clone)]
struct CachedValue {
    payload: String,
    ttl: Duration,
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process TTL cache with per-entry expiration.
#[derive(Clone)]
pub struct Cache {
    inner: moka::future::Cache<String, CachedValue>,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = moka::future::Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { inner }
    }

    /// Raw get; `None` means absent or expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key).await;
        match &hit {
            Some(_) => log::debug!("cache hit: {key}"),
            None => log::debug!("cache miss: {key}"),
        }
        hit.map(|v| v.payload)
    }

    /// Raw set with a per-entry TTL.
    pub async fn set(&self, key: &str, payload: String, ttl: Duration) {
        self.inner
            .insert(key.to_string(), CachedValue { payload, ttl })
            .await;
    }

    /// Get a JSON-typed value. A payload that no longer deserializes is
    /// dropped and reported as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key).await?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding undecodable cache entry {key}: {e}");
                self.inner.invalidate(key).await;
                None
            }
        }
    }

    /// Set a JSON-typed value. Serialization failure is logged and the
    /// entry skipped.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(payload) => self.set(key, payload, ttl).await,
            Err(e) => log::warn!("Failed to cache {key}: {e}"),
        }
    }
}
