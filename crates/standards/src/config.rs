use std::{env, str::FromStr, time::Duration};

use standards_core::cache::Expiration;
use standards_core::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute cache expiration in seconds, 0 disables (default: 300)
    pub cache_absolute_expiration_seconds: u64,
    /// Sliding cache expiration in seconds, 0 disables (default: 60)
    pub cache_sliding_expiration_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Maximum size of event history for SSE (default: 1,000)
    pub event_history_max_size: usize,
    /// Path to SQLite database file (default: "standards.db")
    /// Note: Only used when the `sqlite` feature is enabled.
    #[allow(dead_code)]
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
    /// Delay between outbox polls in milliseconds (default: 1,000)
    pub outbox_poll_interval_ms: u64,
    /// Messages fetched per outbox poll (default: 20)
    pub outbox_batch_size: usize,
    /// Publish attempts before a message is dead-lettered (default: 5)
    pub outbox_max_attempts: u32,
    /// In-process retries for publishing and event handling (default: 3)
    pub retry_max_retries: u32,
    /// First retry delay in milliseconds, doubled per retry (default: 100)
    pub retry_base_delay_ms: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_ABSOLUTE_EXPIRATION_SECONDS` (default: 300)
    /// - `CACHE_SLIDING_EXPIRATION_SECONDS` (default: 60)
    /// - `CACHE_MAX_ENTRIES` (default: 10,000)
    /// - `EVENT_HISTORY_MAX_SIZE` (default: 1,000)
    /// - `SQLITE_PATH` (default: "standards.db")
    /// - `REDIS_URL` (default: "redis://localhost:6379")
    /// - `OUTBOX_POLL_INTERVAL_MS` (default: 1,000)
    /// - `OUTBOX_BATCH_SIZE` (default: 20)
    /// - `OUTBOX_MAX_ATTEMPTS` (default: 5)
    /// - `RETRY_MAX_RETRIES` (default: 3)
    /// - `RETRY_BASE_DELAY_MS` (default: 100)
    pub fn from_env() -> Self {
        Self {
            cache_absolute_expiration_seconds: env_or("CACHE_ABSOLUTE_EXPIRATION_SECONDS", 300),
            cache_sliding_expiration_seconds: env_or("CACHE_SLIDING_EXPIRATION_SECONDS", 60),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", 10_000),
            event_history_max_size: env_or("EVENT_HISTORY_MAX_SIZE", 1_000),
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "standards.db".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            outbox_poll_interval_ms: env_or("OUTBOX_POLL_INTERVAL_MS", 1_000),
            outbox_batch_size: env_or("OUTBOX_BATCH_SIZE", 20),
            outbox_max_attempts: env_or("OUTBOX_MAX_ATTEMPTS", 5),
            retry_max_retries: env_or("RETRY_MAX_RETRIES", 3),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", 100),
        }
    }

    /// Expiration applied to every cache entry.
    pub fn cache_expiration(&self) -> Expiration {
        Expiration::from_secs(
            self.cache_absolute_expiration_seconds,
            self.cache_sliding_expiration_seconds,
        )
    }

    pub fn outbox_poll_interval(&self) -> Duration {
        Duration::from_millis(self.outbox_poll_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
