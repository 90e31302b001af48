use crate::context::Context;
use crate::error::CoordinationError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result type for coordination operations.
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// A linearizable key-value store with advisory locking.
///
/// This is the only cross-node shared resource. It is used purely as a
/// mutual-exclusion primitive plus a place to keep the shared counter.
#[async_trait]
pub trait CoordinationService: Send + Sync + 'static {
    type Lock: CoordinationLock;

    /// Waits up to `timeout` for the named lock.
    ///
    /// Returns `Err(LockTimeout)` if the lock could not be acquired in time.
    async fn wait_acquire(&self, name: &str, timeout: Duration) -> Result<Self::Lock>;

    /// Reads a key. Absent keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a key unconditionally.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Writes a key only while `lock` is still held.
    ///
    /// Services whose locks can lapse while held (leases) must reject the
    /// write with `LeaseLost` once the lock has passed to someone else. The
    /// default is for services whose locks last until released.
    async fn fenced_put(&self, _lock: &Self::Lock, key: &str, value: &str) -> Result<()> {
        self.put(key, value).await
    }
}

/// A held coordination lock.
#[async_trait]
pub trait CoordinationLock: Send + Sync + Sized + 'static {
    /// Releases the lock.
    async fn release(self) -> Result<()>;
}

/// A source of strictly increasing integers, each handed out exactly once.
#[async_trait]
pub trait Counter: Send + Sync + 'static {
    /// Returns the next value of the counter.
    async fn next_value(&self, ctx: &Context) -> Result<u64>;
}

#[async_trait]
impl<T: Counter + ?Sized> Counter for Arc<T> {
    async fn next_value(&self, ctx: &Context) -> Result<u64> {
        (**self).next_value(ctx).await
    }
}
