//! Process wiring shared by the `keyspan` CLI and the HTTP gateway.
//!
//! [`NodeConfig`] is a flattenable set of `clap` arguments (each with a
//! `KEYSPAN_*` environment fallback) and [`build_service`] turns it into a
//! [`ShortenerService`] over trait objects, so adapters are picked at
//! runtime.

use crate::service::ShortenerService;
use anyhow::Context as _;
use clap::builder::TypedValueParser;
use clap::ValueEnum;
use keyspan_cache::{MokaLinkCache, RedisLinkCache};
use keyspan_coordinator::{
    CounterSettings, DistributedCounter, MemoryCoordinator, RedisCoordinator, RedisLockSettings,
};
use keyspan_core::{Context, CoordinationService, LinkCache, Repository};
use keyspan_generator::{
    Generator, IntervalAllocator, IntervalSettings, RandomGenerator, RandomSettings,
};
use keyspan_storage::{InMemoryRepository, MySqlRepository};
use keyspan_telemetry::LogFormat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub const COORDINATOR_ENV: &str = "KEYSPAN_COORDINATOR";
pub const REDIS_URL_ENV: &str = "KEYSPAN_REDIS_URL";
pub const STORAGE_BACKEND_ENV: &str = "KEYSPAN_STORAGE";
pub const MYSQL_DSN_ENV: &str = "KEYSPAN_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "KEYSPAN_CACHE";
pub const CACHE_CAPACITY_ENV: &str = "KEYSPAN_CACHE_CAPACITY";
pub const CACHE_TTL_ENV: &str = "KEYSPAN_CACHE_TTL_SECS";
pub const GENERATOR_ENV: &str = "KEYSPAN_GENERATOR";
pub const INTERVAL_SIZE_ENV: &str = "KEYSPAN_INTERVAL_SIZE";
pub const LOCK_NAME_ENV: &str = "KEYSPAN_LOCK_NAME";
pub const COUNTER_KEY_ENV: &str = "KEYSPAN_COUNTER_KEY";
pub const LOCK_TIMEOUT_ENV: &str = "KEYSPAN_LOCK_TIMEOUT_SECS";
pub const RANDOM_LENGTH_ENV: &str = "KEYSPAN_RANDOM_LENGTH";
pub const NODE_NAME_ENV: &str = "KEYSPAN_NODE_NAME";
pub const LOG_FORMAT_ENV: &str = "KEYSPAN_LOG_FORMAT";

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_NODE_NAME: &str = "keyspan-0";
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// A shortener whose adapters were chosen at runtime.
pub type DynShortenerService =
    ShortenerService<Arc<dyn Repository>, Arc<dyn LinkCache>, Arc<dyn Generator>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoordinatorArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "interval")]
    Interval,
    #[value(name = "random")]
    Random,
}

impl Display for CoordinatorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatorArg::Memory => write!(f, "memory"),
            CoordinatorArg::Redis => write!(f, "redis"),
        }
    }
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Interval => write!(f, "interval"),
            GeneratorArg::Random => write!(f, "random"),
        }
    }
}

/// Backend selection and logging options common to every keyspan process.
#[derive(Debug, Clone, clap::Args)]
pub struct NodeConfig {
    #[arg(
        long,
        global = true,
        env = COORDINATOR_ENV,
        value_enum,
        default_value_t = CoordinatorArg::Memory
    )]
    pub coordinator: CoordinatorArg,

    #[arg(long, global = true, env = REDIS_URL_ENV, default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, global = true, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        global = true,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    /// Entries kept by the in-process cache.
    #[arg(long, global = true, env = CACHE_CAPACITY_ENV, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: u64,

    /// Cache entry lifetime in seconds. Unset keeps entries until evicted.
    #[arg(long, global = true, env = CACHE_TTL_ENV)]
    pub cache_ttl_secs: Option<u64>,

    #[arg(
        long,
        global = true,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Interval
    )]
    pub generator: GeneratorArg,

    /// Codes per claimed interval. Must match on every node.
    #[arg(
        long,
        global = true,
        env = INTERVAL_SIZE_ENV,
        default_value_t = keyspan_generator::interval::DEFAULT_INTERVAL_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_size: u64,

    #[arg(
        long,
        global = true,
        env = LOCK_NAME_ENV,
        default_value = keyspan_coordinator::counter::DEFAULT_LOCK_NAME
    )]
    pub lock_name: String,

    #[arg(
        long,
        global = true,
        env = COUNTER_KEY_ENV,
        default_value = keyspan_coordinator::counter::DEFAULT_COUNTER_KEY
    )]
    pub counter_key: String,

    #[arg(long, global = true, env = LOCK_TIMEOUT_ENV, default_value_t = 2)]
    pub lock_timeout_secs: u64,

    #[arg(
        long,
        global = true,
        env = RANDOM_LENGTH_ENV,
        default_value_t = keyspan_generator::random::DEFAULT_RANDOM_LENGTH,
        value_parser = clap::value_parser!(u8).range(1..=32).map(usize::from)
    )]
    pub random_length: usize,

    #[arg(long, global = true, env = NODE_NAME_ENV, default_value = DEFAULT_NODE_NAME)]
    pub node_name: String,

    #[arg(long, global = true, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Connects the configured adapters and assembles a shortener.
///
/// With `eager` set the interval generator claims its first interval before
/// returning, and a failed claim fails startup.
pub async fn build_service(
    config: &NodeConfig,
    ctx: &Context,
    eager: bool,
) -> anyhow::Result<DynShortenerService> {
    let repository: Arc<dyn Repository> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryRepository::new()),
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(dsn).await?;
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
    };

    let ttl = config.cache_ttl_secs.map(Duration::from_secs);
    let cache: Arc<dyn LinkCache> = match config.cache {
        CacheBackendArg::Moka => match ttl {
            Some(ttl) => Arc::new(MokaLinkCache::with_ttl(config.cache_capacity, ttl)),
            None => Arc::new(MokaLinkCache::with_capacity(config.cache_capacity)),
        },
        CacheBackendArg::Redis => {
            let cache = RedisLinkCache::connect(&config.redis_url).await?;
            match ttl {
                Some(ttl) => Arc::new(cache.with_ttl(ttl)),
                None => Arc::new(cache),
            }
        }
    };

    let generator: Arc<dyn Generator> = match config.generator {
        GeneratorArg::Interval => match config.coordinator {
            CoordinatorArg::Memory => {
                interval_generator(MemoryCoordinator::new(), config, ctx, eager).await?
            }
            CoordinatorArg::Redis => {
                let coordinator =
                    RedisCoordinator::connect(&config.redis_url, RedisLockSettings::default())
                        .await?;
                interval_generator(coordinator, config, ctx, eager).await?
            }
        },
        GeneratorArg::Random => Arc::new(RandomGenerator::new(
            StdRng::from_os_rng(),
            RandomSettings::builder().length(config.random_length).build(),
        )),
    };

    Ok(ShortenerService::new(repository, cache, generator))
}

async fn interval_generator<S: CoordinationService>(
    coordinator: S,
    config: &NodeConfig,
    ctx: &Context,
    eager: bool,
) -> anyhow::Result<Arc<dyn Generator>> {
    let counter = DistributedCounter::new(
        coordinator,
        CounterSettings::builder()
            .lock_name(config.lock_name.as_str())
            .counter_key(config.counter_key.as_str())
            .lock_timeout(Duration::from_secs(config.lock_timeout_secs))
            .build(),
    );
    let settings = IntervalSettings::builder().size(config.interval_size).build();

    let allocator = if eager {
        IntervalAllocator::start(counter, settings, ctx)
            .await
            .context("failed to claim the first interval")?
    } else {
        IntervalAllocator::new(counter, settings)
    };
    Ok(Arc::new(allocator))
}
