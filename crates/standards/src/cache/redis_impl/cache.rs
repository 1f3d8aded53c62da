//! Redis cache implementation.
//!
//! Each entry is a hash with three fields:
//!
//! - `v`: the encoded value
//! - `abs`: absolute deadline in epoch milliseconds, 0 when unset
//! - `sl`: sliding window in milliseconds, 0 when unset
//!
//! The key's own expiry (`PEXPIREAT`) is the earlier of the two deadlines and
//! is pushed forward on every read. List keys are tracked in a per-kind set
//! (`{kind}:_keys`) so that list invalidation does not need `KEYS`.
//!
//! The tracking set lives at least as long as its longest-lived member and
//! never expires while it holds an entry without a deadline. A read that
//! misses a list key removes it from the set.
//!
//! Tracking is not atomic with the entry writes. A stale member in a
//! tracking set only causes a `DEL` of a key that no longer exists.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;

use standards_core::cache::{
    extract_kind, is_list_key, kind_tracking_key, pattern_matches, Cache, Expiration, Result,
};

use super::error::map_redis_error;

const VALUE_FIELD: &str = "v";
const ABSOLUTE_FIELD: &str = "abs";
const SLIDING_FIELD: &str = "sl";

/// Adds `ARGV[1]` to the tracking set `KEYS[1]` and stretches the set's
/// expiry to cover `ARGV[2]` milliseconds, 0 meaning the member never expires.
const TRACK_SCRIPT: &str = r"
redis.call('SADD', KEYS[1], ARGV[1])
local ttl = tonumber(ARGV[2])
if ttl <= 0 then
  return redis.call('PERSIST', KEYS[1])
end
local current = redis.call('PTTL', KEYS[1])
if current == -1 and redis.call('SCARD', KEYS[1]) > 1 then
  return 0
end
if current < ttl then
  return redis.call('PEXPIRE', KEYS[1], ttl)
end
return 0
";

/// Redis cache backend using connection manager for pooling.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
    track: redis::Script,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            conn,
            track: redis::Script::new(TRACK_SCRIPT),
        })
    }

    /// Tracks a list key whose entry expires at `deadline`, if any.
    async fn track(&self, key: &str, now: i64, deadline: Option<i64>) -> Result<()> {
        let Some(kind) = extract_kind(key) else {
            return Ok(());
        };
        let ttl = deadline.map_or(0, |deadline| deadline.saturating_sub(now).max(1));
        let mut conn = self.conn.clone();
        let _: () = self
            .track
            .key(kind_tracking_key(kind))
            .arg(key)
            .arg(ttl)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn untrack(&self, key: &str) -> Result<()> {
        if let Some(kind) = extract_kind(key) {
            let mut conn = self.conn.clone();
            conn.srem::<_, _, ()>(kind_tracking_key(kind), key)
                .await
                .map_err(map_redis_error)?;
        }
        Ok(())
    }
}

fn millis(duration: Option<std::time::Duration>) -> i64 {
    duration.map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Earliest of the absolute deadline and `now + sliding`, 0 meaning none.
fn next_deadline(now: i64, absolute_at: i64, sliding_ms: i64) -> Option<i64> {
    let sliding_at = (sliding_ms > 0).then(|| now.saturating_add(sliding_ms));
    let absolute_at = (absolute_at > 0).then_some(absolute_at);
    match (absolute_at, sliding_at) {
        (Some(a), Some(s)) => Some(a.min(s)),
        (a, s) => a.or(s),
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let (value, absolute_at, sliding_ms): (Option<Vec<u8>>, Option<i64>, Option<i64>) = conn
            .hget(key, &[VALUE_FIELD, ABSOLUTE_FIELD, SLIDING_FIELD])
            .await
            .map_err(map_redis_error)?;

        let Some(value) = value else {
            if is_list_key(key) {
                self.untrack(key).await?;
            }
            return Ok(None);
        };

        let sliding_ms = sliding_ms.unwrap_or(0);
        if sliding_ms > 0 {
            let now = Utc::now().timestamp_millis();
            if let Some(deadline) = next_deadline(now, absolute_at.unwrap_or(0), sliding_ms) {
                let _: () = redis::cmd("PEXPIREAT")
                    .arg(key)
                    .arg(deadline)
                    .query_async(&mut conn)
                    .await
                    .map_err(map_redis_error)?;
                if is_list_key(key) {
                    self.track(key, now, Some(deadline)).await?;
                }
            }
        }

        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp_millis();
        let absolute_at = match millis(expiration.absolute) {
            0 => 0,
            ms => now.saturating_add(ms),
        };
        let sliding_ms = millis(expiration.sliding);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(key)
            .ignore()
            .cmd("HSET")
            .arg(key)
            .arg(VALUE_FIELD)
            .arg(value)
            .arg(ABSOLUTE_FIELD)
            .arg(absolute_at)
            .arg(SLIDING_FIELD)
            .arg(sliding_ms)
            .ignore();
        let deadline = next_deadline(now, absolute_at, sliding_ms);
        if let Some(deadline) = deadline {
            pipe.cmd("PEXPIREAT").arg(key).arg(deadline).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;

        if is_list_key(key) {
            self.track(key, now, deadline).await?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if is_list_key(key) {
            self.untrack(key).await?;
        }

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        // List patterns only ever match tracked keys.
        let tracked = if is_list_key(pattern) {
            extract_kind(pattern).map(kind_tracking_key)
        } else {
            None
        };

        let keys: Vec<String> = match &tracked {
            Some(tracking_key) => conn
                .smembers(tracking_key)
                .await
                .map_err(map_redis_error)?,
            None => redis::cmd("KEYS")
                .arg(pattern)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?,
        };

        let keys: Vec<&String> = keys.iter().filter(|k| pattern_matches(pattern, k)).collect();
        if keys.is_empty() {
            return Ok(());
        }

        conn.del::<_, ()>(&keys).await.map_err(map_redis_error)?;
        if let Some(tracking_key) = &tracked {
            conn.srem::<_, _, ()>(tracking_key, &keys)
                .await
                .map_err(map_redis_error)?;
        }

        Ok(())
    }
}
