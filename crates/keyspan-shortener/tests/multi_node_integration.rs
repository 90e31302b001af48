use std::collections::HashSet;
use std::sync::Arc;

use keyspan_cache::RedisLinkCache;
use keyspan_coordinator::{CounterSettings, DistributedCounter, RedisCoordinator};
use keyspan_core::{Context, Repository, Shortener};
use keyspan_generator::{IntervalAllocator, IntervalSettings};
use keyspan_shortener::{ShortenerError, ShortenerService};
use keyspan_storage::InMemoryRepository;
use keyspan_test_infra::redis::RedisServer;

type Node = ShortenerService<
    Arc<InMemoryRepository>,
    RedisLinkCache,
    IntervalAllocator<DistributedCounter<RedisCoordinator>>,
>;

async fn node(server: &RedisServer, repository: &Arc<InMemoryRepository>, size: u64) -> Node {
    let coordinator = RedisCoordinator::new(server.connection().await.unwrap());
    let counter = DistributedCounter::new(coordinator, CounterSettings::default());
    let allocator = IntervalAllocator::start(
        counter,
        IntervalSettings::builder().size(size).build(),
        &Context::new(),
    )
    .await
    .unwrap();

    ShortenerService::new(
        Arc::clone(repository),
        RedisLinkCache::new(server.connection().await.unwrap()),
        allocator,
    )
}

#[tokio::test]
async fn nodes_claim_disjoint_intervals() {
    let server = RedisServer::new().await.unwrap();
    let repository = Arc::new(InMemoryRepository::new());

    let a = node(&server, &repository, 100_000).await;
    let b = node(&server, &repository, 100_000).await;
    let ctx = Context::new();

    let from_a = a.create(&ctx, "https://a.example").await.unwrap();
    let from_b = b.create(&ctx, "https://b.example").await.unwrap();

    assert_eq!(from_a.value(), Some(1));
    assert_eq!(from_b.value(), Some(100_001));
}

#[tokio::test]
async fn concurrent_nodes_never_mint_the_same_code() {
    let server = RedisServer::new().await.unwrap();
    let repository = Arc::new(InMemoryRepository::new());

    let mut handles = vec![];
    for n in 0..3 {
        let service = Arc::new(node(&server, &repository, 5).await);
        handles.push(tokio::spawn(async move {
            let ctx = Context::new();
            let mut codes = vec![];
            for i in 0..20 {
                let url = format!("https://node{n}.example/{i}");
                codes.push(service.create(&ctx, &url).await.unwrap());
            }
            codes
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for code in handle.await.unwrap() {
            assert!(seen.insert(code));
        }
    }
    assert_eq!(seen.len(), 60);
    assert_eq!(repository.len(), 60);
}

#[tokio::test]
async fn delete_on_one_node_is_seen_by_another() {
    let server = RedisServer::new().await.unwrap();
    let repository = Arc::new(InMemoryRepository::new());

    let a = node(&server, &repository, 10).await;
    let b = node(&server, &repository, 10).await;
    let ctx = Context::new();

    let code = a.create(&ctx, "https://example.com").await.unwrap();
    assert_eq!(b.find(&ctx, &code).await.unwrap(), "https://example.com");

    b.delete(&ctx, &code).await.unwrap();

    let err = a.find(&ctx, &code).await.unwrap_err();
    assert!(matches!(err, ShortenerError::NotFound(_)));
    assert!(repository.find(&code).await.unwrap_err().is_not_found());
}
