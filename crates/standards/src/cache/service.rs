//! Cache-aside over any [`Cache`] backend.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use standards_core::cache::{decode, encode, entity_key, entity_lists_pattern, Cache, Expiration};
use standards_core::domain::EntityKind;

/// Counters reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Backend failures that were absorbed by falling back to storage.
    pub errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Shared cache-aside helper.
///
/// Cache failures never fail the caller: reads fall through to the factory
/// and writes are skipped, both logged at `warn`.
#[derive(Clone)]
pub struct CacheService {
    cache: Arc<dyn Cache>,
    expiration: Expiration,
    counters: Arc<Counters>,
}

impl CacheService {
    pub fn new(cache: Arc<dyn Cache>, expiration: Expiration) -> Self {
        Self {
            cache,
            expiration,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Returns the cached value for `key`, or runs `factory` and caches its
    /// result. Undecodable entries count as misses and are overwritten.
    pub async fn get_or_create<T, E, F, Fut>(&self, key: &str, factory: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match decode::<T>(&bytes) {
                Ok(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to decode cached value");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "Cache read failed");
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(key = %key, "Cache miss");

        let value = factory().await?;

        match encode(&value) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(key, &bytes, self.expiration).await {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to encode value for cache"),
        }

        Ok(value)
    }

    /// Drops the record's entry (when `id` is given) and every list of `kind`.
    pub async fn invalidate_kind(&self, kind: EntityKind, id: Option<Uuid>) {
        if let Some(id) = id {
            if let Err(e) = self.cache.delete(&entity_key(kind, id)).await {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(kind = %kind, id = %id, error = %e, "Failed to invalidate record cache");
            }
        }
        if let Err(e) = self.cache.delete_pattern(&entity_lists_pattern(kind)).await {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(kind = %kind, error = %e, "Failed to invalidate list cache");
        }
        tracing::debug!(kind = %kind, "Invalidated cache");
    }
}
