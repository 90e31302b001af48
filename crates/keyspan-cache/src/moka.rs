use async_trait::async_trait;
use keyspan_core::{CacheError, LinkCache, ShortCode};
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

pub type Result<T> = std::result::Result<T, CacheError>;

const DEFAULT_CAPACITY: u64 = 10_000;

/// An in-process link cache backed by Moka.
///
/// Suited to single-node deployments. With several nodes each one keeps its
/// own copy, so a delete on one node is not seen by the others until the
/// entry expires; pair it with a TTL in that setup.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, String>,
}

impl MokaLinkCache {
    /// Creates a cache holding up to 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }

    /// Entries expire `ttl` after insertion.
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Entries expire after going unread for `tti`.
    pub fn with_tti(max_capacity: u64, tti: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(tti)
            .build();
        Self { cache }
    }

    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        match self.cache.get(code.as_str()).await {
            Some(url) => {
                debug!(code = %code, "moka cache hit");
                Ok(Some(url))
            }
            None => {
                trace!(code = %code, "moka cache miss");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, code: &ShortCode, long_url: &str) -> Result<()> {
        self.cache
            .insert(code.as_str().to_string(), long_url.to_string())
            .await;
        trace!(code = %code, "cached link in moka");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.cache.invalidate(code.as_str()).await;
        trace!(code = %code, "evicted link from moka");
        Ok(())
    }
}

/// Custom configuration for a [`MokaLinkCache`].
#[derive(Debug, TypedBuilder, Default)]
pub struct MokaCacheConfig {
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    #[builder(default, setter(strip_option))]
    ttl: Option<Duration>,
    #[builder(default, setter(strip_option))]
    tti: Option<Duration>,
}

impl From<MokaCacheConfig> for MokaLinkCache {
    fn from(config: MokaCacheConfig) -> Self {
        let mut builder = Cache::builder();

        builder = builder.max_capacity(config.max_capacity.unwrap_or(DEFAULT_CAPACITY));

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaLinkCache {
            cache: builder.build(),
        }
    }
}
