//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. It holds the cached repository, the outbox, the event
//! bus and the SSE history, and supports different backend combinations via
//! feature flags.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use standards_core::cache::{Cache, EventBus};
use standards_core::domain::Entity;
use standards_core::storage::{DocumentRepository, OutboxStore};

use crate::cache::CacheService;
use crate::config::Config;
use crate::consumer::{CacheInvalidationHandler, EventConsumer, EventHistoryHandler};
use crate::history::EventHistory;
use crate::outbox::OutboxWorker;
use crate::service::EntityService;
use crate::storage::CachedDocumentRepository;

/// Names of the compiled-in backends, reported by `/healthz`.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Backends {
    pub storage: &'static str,
    pub cache: &'static str,
}

/// Shared application state.
///
/// This is cloned for each request handler and contains shared resources
/// including repository trait objects for database access.
#[derive(Clone)]
pub struct AppState {
    /// Document repository (cached, wraps underlying storage).
    pub repository: Arc<dyn DocumentRepository>,
    /// Outbox side of the same underlying storage.
    pub outbox: Arc<dyn OutboxStore>,
    /// Event bus the outbox publishes to and the consumer reads from.
    pub bus: Arc<dyn EventBus>,
    /// Cache-aside service shared by the repository and the consumer.
    pub cache: CacheService,
    /// Event history for SSE reconnection catch-up.
    pub history: EventHistory,
    pub backends: Backends,
    /// Shutdown signal sender for SSE connections and background tasks.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    fn build<R>(
        storage: Arc<R>,
        cache: Arc<dyn Cache>,
        bus: Arc<dyn EventBus>,
        config: &Config,
        backends: Backends,
    ) -> Self
    where
        R: DocumentRepository + OutboxStore + 'static,
    {
        let cache = CacheService::new(cache, config.cache_expiration());
        let repository = Arc::new(CachedDocumentRepository::new(storage.clone(), cache.clone()));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            repository,
            outbox: storage,
            bus,
            cache,
            history: EventHistory::new(config.event_history_max_size),
            backends,
            shutdown_tx,
        }
    }

    /// CRUD service for one entity type.
    pub fn service<E: Entity>(&self) -> EntityService<E> {
        EntityService::new(self.repository.clone())
    }

    /// Starts the outbox worker and the event consumer.
    pub async fn spawn_background_tasks(
        &self,
        config: &Config,
    ) -> Result<Vec<JoinHandle<()>>, anyhow::Error> {
        let consumer = EventConsumer::new(self.bus.clone(), config.retry_policy())
            .with_handler(CacheInvalidationHandler::new(self.cache.clone()))
            .with_handler(EventHistoryHandler::new(self.history.clone()));
        let consumer = consumer.spawn(self.subscribe_shutdown()).await?;

        let worker = OutboxWorker::new(self.outbox.clone(), self.bus.clone(), config);
        let worker = tokio::spawn(worker.run(self.subscribe_shutdown()));

        Ok(vec![consumer, worker])
    }

    /// Subscribe to shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal SSE connections and background tasks to shut down.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

// ============================================================================
// Factory functions for different backend combinations
// ============================================================================

#[cfg(all(feature = "sqlite", feature = "memory"))]
mod sqlite_memory {
    use super::*;
    use crate::cache::memory::{MemoryCache, MemoryEventBus};
    use crate::storage::SqliteRepository;

    impl AppState {
        /// Creates AppState with SQLite storage and in-memory cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let sqlite_repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);
            let memory_cache = Arc::new(MemoryCache::new(config.cache_max_entries));
            let memory_bus = Arc::new(MemoryEventBus::new());

            Ok(Self::build(
                sqlite_repo,
                memory_cache,
                memory_bus,
                config,
                Backends {
                    storage: "sqlite",
                    cache: "memory",
                },
            ))
        }
    }
}

#[cfg(all(feature = "sqlite", feature = "redis"))]
mod sqlite_redis {
    use super::*;
    use crate::cache::redis_impl::{RedisCache, RedisEventBus};
    use crate::storage::SqliteRepository;

    impl AppState {
        /// Creates AppState with SQLite storage and Redis cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let sqlite_repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);
            let redis_cache = Arc::new(RedisCache::new(&config.redis_url).await?);
            let redis_bus = Arc::new(RedisEventBus::new(&config.redis_url).await?);

            Ok(Self::build(
                sqlite_repo,
                redis_cache,
                redis_bus,
                config,
                Backends {
                    storage: "sqlite",
                    cache: "redis",
                },
            ))
        }
    }
}

#[cfg(all(feature = "inmemory", feature = "memory"))]
mod inmemory_memory {
    use super::*;
    use crate::cache::memory::{MemoryCache, MemoryEventBus};
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and cache.
        /// Useful for development without any external dependencies.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let inmemory_repo = Arc::new(InMemoryRepository::new());
            let memory_cache = Arc::new(MemoryCache::new(config.cache_max_entries));
            let memory_bus = Arc::new(MemoryEventBus::new());

            Ok(Self::build(
                inmemory_repo,
                memory_cache,
                memory_bus,
                config,
                Backends {
                    storage: "inmemory",
                    cache: "memory",
                },
            ))
        }
    }
}

#[cfg(all(feature = "inmemory", feature = "redis"))]
mod inmemory_redis {
    use super::*;
    use crate::cache::redis_impl::{RedisCache, RedisEventBus};
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and Redis cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let inmemory_repo = Arc::new(InMemoryRepository::new());
            let redis_cache = Arc::new(RedisCache::new(&config.redis_url).await?);
            let redis_bus = Arc::new(RedisEventBus::new(&config.redis_url).await?);

            Ok(Self::build(
                inmemory_repo,
                redis_cache,
                redis_bus,
                config,
                Backends {
                    storage: "inmemory",
                    cache: "redis",
                },
            ))
        }
    }
}

// ============================================================================
// Test support - provides Default implementation for unit tests
// ============================================================================

#[cfg(test)]
mod test_support {
    use super::*;
    use crate::cache::memory::{MemoryCache, MemoryEventBus};
    use crate::storage::InMemoryRepository;

    impl Default for AppState {
        /// Creates an AppState with in-memory storage and cache for testing.
        fn default() -> Self {
            let config = Config::default();
            Self::build(
                Arc::new(InMemoryRepository::new()),
                Arc::new(MemoryCache::new(config.cache_max_entries)),
                Arc::new(MemoryEventBus::new()),
                &config,
                Backends {
                    storage: "inmemory",
                    cache: "memory",
                },
            )
        }
    }
}
