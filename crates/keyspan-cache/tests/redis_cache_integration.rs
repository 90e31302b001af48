use std::time::Duration;

use keyspan_cache::RedisLinkCache;
use keyspan_core::{LinkCache, ShortCode};
use keyspan_test_infra::redis::RedisServer;
use redis::AsyncCommands;

fn code(s: &str) -> ShortCode {
    ShortCode::new(s).unwrap()
}

#[tokio::test]
async fn set_get_del() {
    let server = RedisServer::new().await.unwrap();
    let cache = RedisLinkCache::new(server.connection().await.unwrap());
    let c = code("rML7");

    assert_eq!(cache.get_url(&c).await.unwrap(), None);

    cache.set_url(&c, "https://example.com/a").await.unwrap();
    assert_eq!(
        cache.get_url(&c).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );

    cache.del(&c).await.unwrap();
    assert_eq!(cache.get_url(&c).await.unwrap(), None);

    // Deleting an absent key is not an error.
    cache.del(&c).await.unwrap();
}

#[tokio::test]
async fn keys_live_under_prefix() {
    let server = RedisServer::new().await.unwrap();
    let mut raw = server.connection().await.unwrap();
    let cache = RedisLinkCache::with_prefix(raw.clone(), "test:");

    cache.set_url(&code("b"), "https://example.com").await.unwrap();

    let stored: Option<String> = raw.get("test:b").await.unwrap();
    assert_eq!(stored.as_deref(), Some("https://example.com"));
}

#[tokio::test]
async fn entries_expire_with_ttl() {
    let server = RedisServer::new().await.unwrap();
    let cache = RedisLinkCache::new(server.connection().await.unwrap())
        .with_ttl(Duration::from_secs(1));
    let c = code("emjc");

    cache.set_url(&c, "https://example.com").await.unwrap();
    assert!(cache.get_url(&c).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(cache.get_url(&c).await.unwrap(), None);
}

#[tokio::test]
async fn connect_by_url() {
    let server = RedisServer::new().await.unwrap();
    // Wait until the server accepts connections before connecting by url.
    server.connection().await.unwrap();

    let cache = RedisLinkCache::connect(&server.url().await.unwrap())
        .await
        .unwrap();
    cache.set_url(&code("c"), "https://example.org").await.unwrap();
    assert!(cache.get_url(&code("c")).await.unwrap().is_some());
}
