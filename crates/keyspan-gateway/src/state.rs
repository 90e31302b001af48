use std::sync::Arc;
use std::time::Duration;

use keyspan_core::{Context, Shortener};
use keyspan_shortener::ShortenerError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub type DynShortener = Arc<dyn Shortener<Error = ShortenerError>>;

#[derive(Clone)]
pub struct AppState {
    shortener: DynShortener,
    base_url: String,
    root: Context,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(shortener: DynShortener, public_base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: public_base_url.into(),
            root: Context::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Ties every request to `root`; cancelling it aborts in-flight calls.
    pub fn with_root(mut self, root: Context) -> Self {
        self.root = root;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn shortener(&self) -> &dyn Shortener<Error = ShortenerError> {
        self.shortener.as_ref()
    }

    /// Prefix joined with a code to form the public short URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A fresh context for one request, bounded by the request timeout.
    pub fn request_context(&self) -> Context {
        self.root.child().timeout(self.request_timeout)
    }
}
