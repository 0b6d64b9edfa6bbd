//! Cache stores backing the locale registry.
//!
//! The registry keeps its locale snapshot under a configurable key with an
//! expiration. Stores hold JSON values so any serializable snapshot fits.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Key/value cache with per-entry expiration.
pub trait CacheStore: Send + Sync {
    /// Get a live entry, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store an entry that expires after `ttl`.
    fn put(&self, key: &str, value: Value, ttl: Duration);

    /// Remove an entry. Returns `true` if one was present.
    fn forget(&self, key: &str) -> bool;
}

struct CacheEntry {
    value: Value,
    // None when the ttl is too large to represent
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = entries.get(key)?.is_expired(Utc::now());
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    fn forget(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl CacheStore for NullCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn put(&self, _key: &str, _value: Value, _ttl: Duration) {}

    fn forget(&self, _key: &str) -> bool {
        false
    }
}

/// Pick a cache store for a configured driver name.
///
/// `default` and `memory` give a [`MemoryCache`]; `none` and `array` give a
/// [`NullCache`]. Unknown drivers also fall back to the null cache.
pub fn cache_store_for_driver(driver: &str) -> Arc<dyn CacheStore> {
    match driver {
        "default" | "memory" => Arc::new(MemoryCache::new()),
        "none" | "array" => Arc::new(NullCache),
        other => {
            warn!("Unknown cache driver '{}', locale cache disabled", other);
            Arc::new(NullCache)
        }
    }
}
