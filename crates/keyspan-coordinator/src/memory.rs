use async_trait::async_trait;
use dashmap::DashMap;
use keyspan_core::coordination::Result;
use keyspan_core::{CoordinationError, CoordinationLock, CoordinationService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
struct Inner {
    locks: DashMap<String, Arc<Mutex<()>>>,
    values: DashMap<String, String>,
}

/// In-process coordination service.
///
/// Clones share state, so several counters built from clones of one
/// `MemoryCoordinator` behave like nodes sharing a real coordinator. Useful
/// for single-node deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCoordinator {
    inner: Arc<Inner>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A lock held on a [`MemoryCoordinator`]. Dropping it also releases it.
#[derive(Debug)]
pub struct MemoryLock {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryLock {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl CoordinationLock for MemoryLock {
    async fn release(self) -> Result<()> {
        trace!(lock = %self.name, "releasing in-memory lock");
        Ok(())
    }
}

#[async_trait]
impl CoordinationService for MemoryCoordinator {
    type Lock = MemoryLock;

    async fn wait_acquire(&self, name: &str, timeout: Duration) -> Result<Self::Lock> {
        let mutex = Arc::clone(self.inner.locks.entry(name.to_string()).or_default().value());

        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(MemoryLock {
                name: name.to_string(),
                _guard: guard,
            }),
            Err(_) => Err(CoordinationError::LockTimeout {
                name: name.to_string(),
                timeout,
            }),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.values.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
