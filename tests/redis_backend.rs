//! Integration tests for the Redis backends.
//!
//! These tests require a Redis instance running at `redis://127.0.0.1/`.
//! Tests are ignored by default - run with
//! `cargo test --test redis_backend -- --ignored`

#![cfg(feature = "redis-backend")]

use std::sync::Arc;
use std::time::Duration;

use vox_resilience::{
    CacheStore, RateCounter, RedisCacheConfig, RedisCacheStore, RedisCounterConfig,
    RedisSlidingCounter, SystemClock,
};
use vox_resilience::application::ports::Clock;

/// Check if Redis is available before running tests
async fn redis_available() -> bool {
    RedisSlidingCounter::connect("redis://127.0.0.1/").await.is_ok()
}

async fn test_counter(test_name: &str) -> RedisSlidingCounter {
    let config = RedisCounterConfig {
        key_prefix: format!("test:rl:{}:", test_name),
    };
    RedisSlidingCounter::connect_with_config("redis://127.0.0.1/", config)
        .await
        .expect("Failed to connect to Redis")
}

async fn test_store(test_name: &str) -> RedisCacheStore {
    let config = RedisCacheConfig {
        key_prefix: format!("test:cache:{}:", test_name),
    };
    RedisCacheStore::connect_with_config("redis://127.0.0.1/", config)
        .await
        .expect("Failed to connect to Redis")
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_counts_within_window() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available at redis://127.0.0.1/");
        return;
    }

    let counter = test_counter("counts").await;
    let clock = SystemClock::new();
    let now = clock.now_ms();
    let key = format!("chat:user:{now}");

    for expected in 1..=3u64 {
        let usage = counter.record(&key, now + expected, 60_000).await.unwrap();
        assert_eq!(usage.count, expected);
    }
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_window_slides() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let counter = test_counter("slides").await;
    let clock = SystemClock::new();
    let now = clock.now_ms();
    let key = format!("api:user:{now}");

    let usage = counter.record(&key, now, 1_000).await.unwrap();
    assert_eq!(usage.count, 1);

    // Two seconds later the first entry has slid out.
    let usage = counter.record(&key, now + 2_000, 1_000).await.unwrap();
    assert_eq!(usage.count, 1);
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_keys_are_independent() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let counter = test_counter("independent").await;
    let clock = SystemClock::new();
    let now = clock.now_ms();

    counter
        .record(&format!("a:{now}"), now, 60_000)
        .await
        .unwrap();
    let other = counter
        .record(&format!("b:{now}"), now, 60_000)
        .await
        .unwrap();
    assert_eq!(other.count, 1);
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_store_roundtrip_and_delete() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = test_store("roundtrip").await;
    let clock = SystemClock::new();
    let key = format!("subscription:u{}", clock.now_ms());

    store
        .put(&key, b"{\"tier\":\"pro\"}".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(
        store.get(&key).await.unwrap(),
        Some(b"{\"tier\":\"pro\"}".to_vec())
    );

    assert_eq!(store.delete(&key).await.unwrap(), 1);
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_store_pattern_invalidation() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = test_store("pattern").await;
    let clock = SystemClock::new();
    let run = clock.now_ms();
    let ttl = Duration::from_secs(60);

    for user in ["u1", "u2", "u3"] {
        store
            .put(&format!("chats:{run}:{user}"), b"[]".to_vec(), ttl)
            .await
            .unwrap();
    }
    store
        .put(&format!("voices:{run}:u1"), b"[]".to_vec(), ttl)
        .await
        .unwrap();

    let removed = store
        .delete_matching(&format!("chats:{run}:*"))
        .await
        .unwrap();
    assert_eq!(removed, 3);

    assert!(store
        .get(&format!("voices:{run}:u1"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_shared_across_clients() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let first = test_counter("shared").await;
    let second = test_counter("shared").await;
    let clock = SystemClock::new();
    let now = clock.now_ms();
    let key = format!("chat:user:{now}");

    first.record(&key, now, 60_000).await.unwrap();
    let usage = second.record(&key, now + 1, 60_000).await.unwrap();
    assert_eq!(usage.count, 2);
}
