use async_trait::async_trait;
use keyspan_core::{CacheError, LinkCache, ShortCode};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub type Result<T> = std::result::Result<T, CacheError>;

pub const DEFAULT_KEY_PREFIX: &str = "ks:url:";

/// A link cache shared by every node through Redis.
///
/// Long URLs are stored as plain strings under `{prefix}{code}`.
#[derive(Debug, Clone)]
pub struct RedisLinkCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
    ttl: Option<Duration>,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisLinkCache {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a cache that namespaces its keys under `key_prefix`.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            ttl: None,
        }
    }

    /// Entries written from now on expire after `ttl`. Sub-second
    /// precision is dropped; anything under one second becomes one second.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Initialization(format!("failed to connect to redis: {e}")))?;
        Ok(Self::new(conn))
    }

    fn cache_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        let key = self.cache_key(code);
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(url)) => {
                debug!(code = %code, "redis cache hit");
                Ok(Some(url))
            }
            Ok(None) => {
                trace!(code = %code, "redis cache miss");
                Ok(None)
            }
            Err(e) => {
                warn!(code = %code, error = %e, "redis error on get");
                Err(map_redis_error("failed to fetch value from redis", e))
            }
        }
    }

    async fn set_url(&self, code: &ShortCode, long_url: &str) -> Result<()> {
        let key = self.cache_key(code);
        let mut conn = self.conn.clone();

        let result = match self.ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(&key, long_url, ttl.as_secs().max(1))
                    .await
            }
            None => conn.set::<_, _, ()>(&key, long_url).await,
        };

        result.map_err(|e| {
            warn!(code = %code, error = %e, "failed to cache link in redis");
            map_redis_error("failed to write value to redis", e)
        })?;
        trace!(code = %code, "cached link in redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.cache_key(code);
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(&key).await.map_err(|e| {
            warn!(code = %code, error = %e, "failed to evict link from redis");
            map_redis_error("failed to delete value from redis", e)
        })?;
        trace!(code = %code, "evicted link from redis");
        Ok(())
    }
}
