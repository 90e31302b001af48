use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A short code and the long URL it redirects to.
///
/// Links are immutable once created; the short code is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub code: ShortCode,
    pub long_url: String,
}

impl Link {
    pub fn new(code: ShortCode, long_url: impl Into<String>) -> Self {
        Self {
            code,
            long_url: long_url.into(),
        }
    }
}

/// Durable, authoritative storage for [`Link`]s.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Persists a new link.
    ///
    /// Returns `Err(Conflict)` if the code is already taken. A conflict
    /// must always surface; it is never swallowed.
    async fn create(&self, link: &Link) -> Result<()>;

    /// Retrieves the link for a short code, or `Err(NotFound)`.
    async fn find(&self, code: &ShortCode) -> Result<Link>;

    /// Removes the link for a short code, or returns `Err(NotFound)`.
    async fn delete(&self, code: &ShortCode) -> Result<()>;
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn create(&self, link: &Link) -> Result<()> {
        (**self).create(link).await
    }

    async fn find(&self, code: &ShortCode) -> Result<Link> {
        (**self).find(code).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        (**self).delete(code).await
    }
}
