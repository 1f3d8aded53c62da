//! Cached repository decorator.
//!
//! Wraps any `DocumentRepository` with the cache-aside pattern:
//!
//! - **Reads**: record, list and search results come from the cache, on miss
//!   from the repository (then cached)
//! - **Writes**: persist, then drop the record's key and every list of its kind
//!
//! ```ignore
//! let repo = Arc::new(SqliteRepository::new("standards.db").await?);
//! let cache = CacheService::new(Arc::new(MemoryCache::new(10_000)), config.cache_expiration());
//! let cached = CachedDocumentRepository::new(repo, cache);
//! ```

mod documents;

pub use documents::CachedDocumentRepository;
