use async_trait::async_trait;
use keyspan_core::coordination::Result;
use keyspan_core::{Context, CoordinationError, CoordinationLock, CoordinationService, Counter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_LOCK_NAME: &str = "/locker";
pub const DEFAULT_COUNTER_KEY: &str = "/counter";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Names and timeouts used by a [`DistributedCounter`].
///
/// Every node sharing a coordinator must use the same lock name and
/// counter key.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CounterSettings {
    /// Name of the mutual-exclusion lock guarding the counter.
    #[builder(default = DEFAULT_LOCK_NAME.to_string(), setter(into))]
    pub lock_name: String,
    /// Key the counter value is stored under.
    #[builder(default = DEFAULT_COUNTER_KEY.to_string(), setter(into))]
    pub counter_key: String,
    /// How long to wait for the lock before giving up with `LockTimeout`.
    #[builder(default = DEFAULT_LOCK_TIMEOUT)]
    pub lock_timeout: Duration,
    /// Upper bound on a lock release. A release that takes longer is
    /// abandoned and the lock is left to expire on its own.
    #[builder(default = DEFAULT_RELEASE_TIMEOUT)]
    pub release_timeout: Duration,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A cluster-wide counter built on a [`CoordinationService`].
///
/// Each call takes the coordination lock, reads the stored value (absent
/// reads as zero), writes back `value + 1` through
/// [`fenced_put`](CoordinationService::fenced_put) and releases the lock.
/// The lock is released on every exit path, so a node that fails half way
/// never blocks the others. A write attempted after a lease lapsed is
/// rejected rather than applied.
///
/// Cancelling the context while an acquisition request is in flight can
/// leave a lock granted on the server with no local handle to release it.
/// Such an orphan is only reclaimed when its lease expires, so other nodes
/// may wait up to one lease for it.
pub struct DistributedCounter<S> {
    service: Arc<S>,
    settings: CounterSettings,
}

impl<S: CoordinationService> DistributedCounter<S> {
    pub fn new(service: S, settings: CounterSettings) -> Self {
        Self::from_shared(Arc::new(service), settings)
    }

    pub fn from_shared(service: Arc<S>, settings: CounterSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &CounterSettings {
        &self.settings
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Read-increment-write under `lock`.
    async fn increment(&self, lock: &S::Lock) -> Result<u64> {
        let key = &self.settings.counter_key;

        let current = match self.service.get(key).await? {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                CoordinationError::InvalidData(format!(
                    "counter '{key}' holds non-numeric value '{raw}': {e}"
                ))
            })?,
            None => 0,
        };

        let next = current.checked_add(1).ok_or_else(|| {
            CoordinationError::InvalidData(format!("counter '{key}' is exhausted"))
        })?;

        self.service
            .fenced_put(lock, key, &next.to_string())
            .await?;
        Ok(next)
    }
}

#[async_trait]
impl<S: CoordinationService> Counter for DistributedCounter<S> {
    async fn next_value(&self, ctx: &Context) -> Result<u64> {
        let lock_name = &self.settings.lock_name;
        trace!(lock = %lock_name, "acquiring coordination lock");

        let lock = ctx
            .run(
                self.service
                    .wait_acquire(lock_name, self.settings.lock_timeout),
            )
            .await
            .map_err(|_| CoordinationError::Cancelled)??;

        let result = ctx
            .run(self.increment(&lock))
            .await
            .unwrap_or(Err(CoordinationError::Cancelled));

        match tokio::time::timeout(self.settings.release_timeout, lock.release()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(lock = %lock_name, error = %e, "failed to release coordination lock")
            }
            Err(_) => warn!(
                lock = %lock_name,
                timeout = ?self.settings.release_timeout,
                "lock release timed out, leaving it to expire"
            ),
        }

        match &result {
            Ok(value) => debug!(counter = %self.settings.counter_key, value, "counter advanced"),
            Err(e) => warn!(counter = %self.settings.counter_key, error = %e, "counter increment failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCoordinator, MemoryLock};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps a [`MemoryCoordinator`] and injects failures on demand.
    #[derive(Default)]
    struct FlakyCoordinator {
        inner: MemoryCoordinator,
        fail_get: AtomicBool,
        fail_put: AtomicBool,
        lose_lease: AtomicBool,
        stall_get: AtomicBool,
        stall_release: AtomicBool,
        releases: Arc<AtomicUsize>,
    }

    struct CountingLock {
        inner: MemoryLock,
        releases: Arc<AtomicUsize>,
        stall: bool,
    }

    #[async_trait]
    impl CoordinationLock for CountingLock {
        async fn release(self) -> Result<()> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.inner.release().await
        }
    }

    #[async_trait]
    impl CoordinationService for FlakyCoordinator {
        type Lock = CountingLock;

        async fn wait_acquire(&self, name: &str, timeout: Duration) -> Result<Self::Lock> {
            let inner = self.inner.wait_acquire(name, timeout).await?;
            Ok(CountingLock {
                inner,
                releases: Arc::clone(&self.releases),
                stall: self.stall_release.load(Ordering::SeqCst),
            })
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.stall_get.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.fail_get.load(Ordering::SeqCst) {
                return Err(CoordinationError::Io("get refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_put.load(Ordering::SeqCst) {
                return Err(CoordinationError::Io("put refused".to_string()));
            }
            self.inner.put(key, value).await
        }

        async fn fenced_put(&self, lock: &Self::Lock, key: &str, value: &str) -> Result<()> {
            if self.lose_lease.load(Ordering::SeqCst) {
                return Err(CoordinationError::LeaseLost {
                    name: lock.inner.name().to_string(),
                });
            }
            self.put(key, value).await
        }
    }

    fn short_timeout() -> CounterSettings {
        CounterSettings::builder()
            .lock_timeout(Duration::from_millis(50))
            .build()
    }

    #[tokio::test]
    async fn absent_counter_starts_at_one() {
        let counter = DistributedCounter::new(MemoryCoordinator::new(), CounterSettings::default());
        let ctx = Context::new();

        assert_eq!(counter.next_value(&ctx).await.unwrap(), 1);
        assert_eq!(counter.next_value(&ctx).await.unwrap(), 2);
        assert_eq!(counter.next_value(&ctx).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn resumes_from_stored_value() {
        let coordinator = MemoryCoordinator::new();
        coordinator.put(DEFAULT_COUNTER_KEY, "41").await.unwrap();

        let counter = DistributedCounter::new(coordinator.clone(), CounterSettings::default());
        assert_eq!(counter.next_value(&Context::new()).await.unwrap(), 42);
        assert_eq!(
            coordinator.get(DEFAULT_COUNTER_KEY).await.unwrap().as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn concurrent_callers_never_share_a_value() {
        let coordinator = Arc::new(MemoryCoordinator::new());
        let mut handles = vec![];

        // Several "nodes", each with its own counter over the same coordinator.
        for _ in 0..8 {
            let counter = DistributedCounter::from_shared(
                Arc::clone(&coordinator),
                CounterSettings::default(),
            );
            handles.push(tokio::spawn(async move {
                let ctx = Context::new();
                let mut seen = vec![];
                for _ in 0..25 {
                    seen.push(counter.next_value(&ctx).await.unwrap());
                }
                seen
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for value in handle.await.unwrap() {
                assert!(all.insert(value), "value {value} handed out twice");
            }
        }

        assert_eq!(all.len(), 200);
        assert_eq!(all, (1..=200).collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn held_lock_times_out() {
        let coordinator = MemoryCoordinator::new();
        let _held = coordinator
            .wait_acquire(DEFAULT_LOCK_NAME, Duration::from_millis(10))
            .await
            .unwrap();

        let counter = DistributedCounter::new(coordinator.clone(), short_timeout());
        let err = counter.next_value(&Context::new()).await.unwrap_err();

        assert!(matches!(err, CoordinationError::LockTimeout { .. }));
        assert!(err.is_retryable());
        assert_eq!(coordinator.get(DEFAULT_COUNTER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_write_releases_lock() {
        let flaky = Arc::new(FlakyCoordinator::default());
        let counter = DistributedCounter::from_shared(Arc::clone(&flaky), short_timeout());
        let ctx = Context::new();

        flaky.fail_put.store(true, Ordering::SeqCst);
        let err = counter.next_value(&ctx).await.unwrap_err();
        assert!(matches!(err, CoordinationError::Io(_)));
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);

        // The lock is free again, so the next call goes through.
        flaky.fail_put.store(false, Ordering::SeqCst);
        assert_eq!(counter.next_value(&ctx).await.unwrap(), 1);
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_read_releases_lock() {
        let flaky = Arc::new(FlakyCoordinator::default());
        let counter = DistributedCounter::from_shared(Arc::clone(&flaky), short_timeout());

        flaky.fail_get.store(true, Ordering::SeqCst);
        assert!(counter.next_value(&Context::new()).await.is_err());
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn corrupted_value_is_invalid_data() {
        let coordinator = MemoryCoordinator::new();
        coordinator.put(DEFAULT_COUNTER_KEY, "forty-two").await.unwrap();

        let counter = DistributedCounter::new(coordinator, short_timeout());
        let err = counter.next_value(&Context::new()).await.unwrap_err();

        assert!(matches!(err, CoordinationError::InvalidData(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn cancelled_while_waiting_for_lock() {
        let coordinator = MemoryCoordinator::new();
        let _held = coordinator
            .wait_acquire(DEFAULT_LOCK_NAME, Duration::from_millis(10))
            .await
            .unwrap();

        let counter = DistributedCounter::new(coordinator, CounterSettings::default());
        let ctx = Context::new();
        ctx.cancel();

        let err = counter.next_value(&ctx).await.unwrap_err();
        assert!(matches!(err, CoordinationError::Cancelled));
    }

    #[tokio::test]
    async fn cancelled_during_io_still_releases_lock() {
        let flaky = Arc::new(FlakyCoordinator::default());
        let counter = DistributedCounter::from_shared(Arc::clone(&flaky), short_timeout());

        flaky.stall_get.store(true, Ordering::SeqCst);
        let ctx = Context::with_timeout(Duration::from_millis(50));
        let err = counter.next_value(&ctx).await.unwrap_err();

        assert!(matches!(err, CoordinationError::Cancelled));
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);

        flaky.stall_get.store(false, Ordering::SeqCst);
        assert_eq!(counter.next_value(&Context::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lapsed_lease_rejects_the_write() {
        let flaky = Arc::new(FlakyCoordinator::default());
        let counter = DistributedCounter::from_shared(Arc::clone(&flaky), short_timeout());
        flaky.inner.put(DEFAULT_COUNTER_KEY, "5").await.unwrap();

        flaky.lose_lease.store(true, Ordering::SeqCst);
        let err = counter.next_value(&Context::new()).await.unwrap_err();

        assert!(matches!(err, CoordinationError::LeaseLost { .. }));
        assert!(err.is_retryable());
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);
        assert_eq!(
            flaky.inner.get(DEFAULT_COUNTER_KEY).await.unwrap().as_deref(),
            Some("5")
        );

        flaky.lose_lease.store(false, Ordering::SeqCst);
        assert_eq!(counter.next_value(&Context::new()).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn stuck_release_does_not_hang_the_caller() {
        let flaky = Arc::new(FlakyCoordinator::default());
        let settings = CounterSettings::builder()
            .lock_timeout(Duration::from_millis(50))
            .release_timeout(Duration::from_millis(50))
            .build();
        let counter = DistributedCounter::from_shared(Arc::clone(&flaky), settings);

        flaky.stall_release.store(true, Ordering::SeqCst);
        let value = tokio::time::timeout(Duration::from_secs(5), counter.next_value(&Context::new()))
            .await
            .expect("next_value hung on release")
            .unwrap();
        assert_eq!(value, 1);

        // The abandoned release future dropped the in-memory guard with it.
        flaky.stall_release.store(false, Ordering::SeqCst);
        assert_eq!(counter.next_value(&Context::new()).await.unwrap(), 2);
    }
}
