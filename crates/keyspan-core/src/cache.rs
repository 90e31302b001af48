use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A fast, best-effort cache of short code to long URL.
///
/// The cache is never authoritative: callers treat every error as advisory
/// and fall back to the [`Repository`](crate::Repository).
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get the long URL for a code.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store the long URL for a code.
    async fn set_url(&self, code: &ShortCode, long_url: &str) -> Result<()>;

    /// Remove a code from the cache.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}

#[async_trait]
impl<T: LinkCache + ?Sized> LinkCache for Arc<T> {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        (**self).get_url(code).await
    }

    async fn set_url(&self, code: &ShortCode, long_url: &str) -> Result<()> {
        (**self).set_url(code, long_url).await
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        (**self).del(code).await
    }
}
