//! In-memory cache with LRU eviction and absolute/sliding expiration.
//!
//! List keys (`{kind}:list:*`) are tracked per entity kind so that
//! invalidating a kind's lists does not scan the whole store.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use standards_core::cache::{
    extract_kind, is_list_key, pattern_matches, Cache, Expiration, Result,
};
use standards_core::domain::EntityKind;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expiration: Expiration,
    created: Instant,
    last_access: Instant,
}

impl CacheEntry {
    fn new(value: Vec<u8>, expiration: Expiration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expiration,
            created: now,
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expiration
            .deadline(self.created, self.last_access)
            .is_some_and(|deadline| now >= deadline)
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Expired entries are dropped lazily when read. A read of a live entry
/// moves its sliding window forward.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// Maps kind -> list keys currently cached for it.
    tracking: Arc<RwLock<HashMap<EntityKind, HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_entries` entries. Zero falls back
    /// to the default capacity.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(DEFAULT_CAPACITY);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of entries held, expired ones included until they are read.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    async fn untrack(&self, key: &str) {
        if let Some(kind) = extract_kind(key) {
            let mut tracking = self.tracking.write().await;
            if let Some(keys) = tracking.get_mut(&kind) {
                keys.remove(key);
                if keys.is_empty() {
                    tracking.remove(&kind);
                }
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let mut store = self.store.write().await;
            match store.get_mut(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => {
                    entry.last_access = now;
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
            store.pop(key);
        }

        if is_list_key(key) {
            self.untrack(key).await;
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        let evicted = {
            let mut store = self.store.write().await;
            store
                .push(key.to_string(), CacheEntry::new(value.to_vec(), expiration))
                .map(|(evicted, _)| evicted)
                .filter(|evicted| evicted != key)
        };

        // An entry pushed out by the LRU no longer needs invalidating.
        if let Some(evicted) = evicted.filter(|evicted| is_list_key(evicted)) {
            self.untrack(&evicted).await;
        }

        if is_list_key(key) {
            if let Some(kind) = extract_kind(key) {
                let mut tracking = self.tracking.write().await;
                tracking.entry(kind).or_default().insert(key.to_string());
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.pop(key);
        if is_list_key(key) {
            self.untrack(key).await;
        }
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // List patterns only ever match tracked keys.
        if is_list_key(pattern) {
            if let Some(kind) = extract_kind(pattern) {
                let matching: Vec<String> = {
                    let mut tracking = self.tracking.write().await;
                    let Some(keys) = tracking.get_mut(&kind) else {
                        return Ok(());
                    };
                    let matching: Vec<String> = keys
                        .iter()
                        .filter(|k| pattern_matches(pattern, k))
                        .cloned()
                        .collect();
                    for key in &matching {
                        keys.remove(key);
                    }
                    if keys.is_empty() {
                        tracking.remove(&kind);
                    }
                    matching
                };

                let mut store = self.store.write().await;
                for key in &matching {
                    store.pop(key);
                }
                return Ok(());
            }
        }

        let matching: Vec<String> = {
            let store = self.store.read().await;
            store
                .iter()
                .filter(|(k, _)| pattern_matches(pattern, k))
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in &matching {
            self.delete(key).await?;
        }
        Ok(())
    }
}
