//! [`LinkCache`](keyspan_core::LinkCache) implementations.
//!
//! Cache contents are advisory: callers fall back to the repository on a
//! miss or an error, so none of these types retry.

pub mod moka;
pub mod redis;

pub use self::moka::{MokaCacheConfig, MokaLinkCache};
pub use self::redis::RedisLinkCache;
