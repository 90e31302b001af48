use crate::error::{Result, ShortenerError};
use async_trait::async_trait;
use keyspan_core::{Context, Link, LinkCache, Repository, ShortCode, Shortener, StorageError};
use keyspan_generator::Generator;
use tracing::{debug, error, trace, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// Evict the cache entry a second time once the durable delete has
    /// succeeded, dropping anything a concurrent `find` wrote back in
    /// between.
    #[builder(default = true)]
    pub evict_after_delete: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Cache-aside URL shortener.
///
/// Writes go to the repository first and then, best effort, to the cache.
/// Reads try the cache and fall back to the repository on a miss or on any
/// cache error. Cache failures are logged and never reach the caller.
///
/// A code whose `create` fails after allocation is not handed out again.
pub struct ShortenerService<R, C, G> {
    repository: R,
    cache: C,
    generator: G,
    settings: ServiceSettings,
}

impl<R: Repository, C: LinkCache, G: Generator> ShortenerService<R, C, G> {
    pub fn new(repository: R, cache: C, generator: G) -> Self {
        Self::with_settings(repository, cache, generator, ServiceSettings::default())
    }

    pub fn with_settings(repository: R, cache: C, generator: G, settings: ServiceSettings) -> Self {
        Self {
            repository,
            cache,
            generator,
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    async fn populate(&self, ctx: &Context, code: &ShortCode, long_url: &str) {
        match ctx.run(self.cache.set_url(code, long_url)).await {
            Ok(Ok(())) => trace!(code = %code, "cache populated"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "failed to populate cache"),
            Err(_) => debug!(code = %code, "cancelled before cache populate"),
        }
    }

    async fn evict(&self, ctx: &Context, code: &ShortCode) {
        match ctx.run(self.cache.del(code)).await {
            Ok(Ok(())) => trace!(code = %code, "cache entry evicted"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "failed to evict cache entry"),
            Err(_) => debug!(code = %code, "cancelled before cache eviction"),
        }
    }
}

fn lookup_error(code: &ShortCode, err: StorageError) -> ShortenerError {
    match err {
        StorageError::NotFound(_) => ShortenerError::NotFound(code.to_string()),
        other => ShortenerError::Storage(other),
    }
}

#[async_trait]
impl<R: Repository, C: LinkCache, G: Generator> Shortener for ShortenerService<R, C, G> {
    type Error = ShortenerError;

    async fn create(&self, ctx: &Context, long_url: &str) -> Result<ShortCode> {
        let code = self.generator.next_code(ctx).await?;
        let link = Link::new(code.clone(), long_url);

        if let Err(e) = ctx.run(self.repository.create(&link)).await? {
            error!(code = %code, error = %e, "failed to store link, code is burned");
            return Err(ShortenerError::CreateFailed(e));
        }
        debug!(code = %code, "link created");

        self.populate(ctx, &code, long_url).await;
        Ok(code)
    }

    async fn find(&self, ctx: &Context, code: &ShortCode) -> Result<String> {
        match ctx.run(self.cache.get_url(code)).await? {
            Ok(Some(long_url)) => {
                trace!(code = %code, "served from cache");
                return Ok(long_url);
            }
            Ok(None) => trace!(code = %code, "cache miss"),
            Err(e) => warn!(code = %code, error = %e, "cache unavailable, reading repository"),
        }

        let link = ctx
            .run(self.repository.find(code))
            .await?
            .map_err(|e| lookup_error(code, e))?;

        self.populate(ctx, code, &link.long_url).await;
        Ok(link.long_url)
    }

    async fn delete(&self, ctx: &Context, code: &ShortCode) -> Result<()> {
        self.evict(ctx, code).await;

        ctx.run(self.repository.delete(code))
            .await?
            .map_err(|e| lookup_error(code, e))?;
        debug!(code = %code, "link deleted");

        if self.settings.evict_after_delete {
            self.evict(ctx, code).await;
        }
        Ok(())
    }
}
