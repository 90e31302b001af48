use crate::context::Context;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// The create/find/delete surface of a URL shortener.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Mints a new short code for `long_url` and persists the mapping.
    async fn create(&self, ctx: &Context, long_url: &str) -> Result<ShortCode, Self::Error>;

    /// Resolves a short code to its long URL.
    async fn find(&self, ctx: &Context, code: &ShortCode) -> Result<String, Self::Error>;

    /// Deletes a short code.
    async fn delete(&self, ctx: &Context, code: &ShortCode) -> Result<(), Self::Error>;
}
