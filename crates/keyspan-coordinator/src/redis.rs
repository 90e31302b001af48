use async_trait::async_trait;
use keyspan_core::coordination::Result;
use keyspan_core::{CoordinationError, CoordinationLock, CoordinationService};
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Deletes the lock key only if it still carries our token, so a lock whose
/// lease already expired and was taken by another node is left alone.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Writes `KEYS[2]` only while `KEYS[1]` still carries our token. Returns 1
/// on write, 0 when the lease has lapsed.
const FENCED_SET_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    redis.call("SET", KEYS[2], ARGV[2])
    return 1
else
    return 0
end
"#;

/// Tuning for locks taken through a [`RedisCoordinator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisLockSettings {
    /// Lease after which Redis drops a lock whose holder vanished.
    #[builder(default = Duration::from_secs(10))]
    pub lease: Duration,
    /// Pause between acquisition attempts while the lock is taken.
    #[builder(default = Duration::from_millis(50))]
    pub retry_interval: Duration,
    /// Prefix prepended to every key this coordinator touches.
    #[builder(default = "ks:coord:".to_string(), setter(into))]
    pub key_prefix: String,
}

impl Default for RedisLockSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A Redis-backed [`CoordinationService`].
///
/// Locks are `SET NX PX` leases identified by a random token; the counter is
/// a plain string key. Writes made under a lock go through a script that
/// checks the token first, so a holder whose lease expired mid-increment
/// cannot overwrite the value written by the next holder.
#[derive(Debug, Clone)]
pub struct RedisCoordinator {
    conn: redis::aio::MultiplexedConnection,
    settings: RedisLockSettings,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CoordinationError {
    CoordinationError::Io(format!("{operation}: {err}"))
}

impl RedisCoordinator {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_settings(conn, RedisLockSettings::default())
    }

    pub fn with_settings(
        conn: redis::aio::MultiplexedConnection,
        settings: RedisLockSettings,
    ) -> Self {
        Self { conn, settings }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str, settings: RedisLockSettings) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to redis", e))?;
        Ok(Self::with_settings(conn, settings))
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.settings.key_prefix, name)
    }

    async fn try_acquire(&self, key: &str, token: &str) -> Result<bool> {
        let lease_ms = u64::try_from(self.settings.lease.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(lease_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to acquire lock", e))?;
        Ok(reply.is_some())
    }
}

/// A lease held on a [`RedisCoordinator`].
#[derive(Debug)]
pub struct RedisLock {
    conn: redis::aio::MultiplexedConnection,
    name: String,
    key: String,
    token: String,
}

#[async_trait]
impl CoordinationLock for RedisLock {
    async fn release(self) -> Result<()> {
        let mut conn = self.conn.clone();
        let script = redis::Script::new(RELEASE_SCRIPT);
        let removed: i64 = script
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to release lock", e))?;

        if removed == 0 {
            warn!(lock = %self.key, "lock lease expired before release");
        } else {
            trace!(lock = %self.key, "released redis lock");
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationService for RedisCoordinator {
    type Lock = RedisLock;

    async fn wait_acquire(&self, name: &str, timeout: Duration) -> Result<Self::Lock> {
        let key = self.key(name);
        let token = format!("{:032x}", rand::random::<u128>());
        let deadline = Instant::now() + timeout;

        loop {
            if self.try_acquire(&key, &token).await? {
                debug!(lock = %key, "acquired redis lock");
                return Ok(RedisLock {
                    conn: self.conn.clone(),
                    name: name.to_string(),
                    key,
                    token,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CoordinationError::LockTimeout {
                    name: name.to_string(),
                    timeout,
                });
            }

            trace!(lock = %key, "lock busy, retrying");
            tokio::time::sleep(self.settings.retry_interval.min(deadline - now)).await;
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.key(key))
            .await
            .map_err(|e| map_redis_error("failed to read key", e))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.key(key), value)
            .await
            .map_err(|e| map_redis_error("failed to write key", e))
    }

    async fn fenced_put(&self, lock: &Self::Lock, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let script = redis::Script::new(FENCED_SET_SCRIPT);
        let written: i64 = script
            .key(&lock.key)
            .key(self.key(key))
            .arg(&lock.token)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to write key under lock", e))?;

        if written == 0 {
            warn!(lock = %lock.key, key, "lease lapsed, write rejected");
            return Err(CoordinationError::LeaseLost {
                name: lock.name.clone(),
            });
        }
        Ok(())
    }
}
