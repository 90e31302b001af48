//! Cross-node coordination for interval allocation.
//!
//! [`DistributedCounter`] turns any [`CoordinationService`] into a
//! [`Counter`]: a strictly increasing integer that every node can draw from
//! without ever observing the same value twice.
//!
//! [`CoordinationService`]: keyspan_core::CoordinationService
//! [`Counter`]: keyspan_core::Counter

pub mod counter;
pub mod memory;
pub mod redis;

pub use counter::{CounterSettings, DistributedCounter};
pub use memory::{MemoryCoordinator, MemoryLock};
pub use self::redis::{RedisCoordinator, RedisLock, RedisLockSettings};
