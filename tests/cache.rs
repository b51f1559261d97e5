//! Read-through cache behavior: hit/miss semantics, degradation, and
//! invalidation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vox_resilience::infrastructure::mocks::{FailingStore, InMemoryStore, MockClock};
use vox_resilience::{keys, ReadThroughCache, UpstreamStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Subscription {
    tier: String,
}

fn pro() -> Subscription {
    Subscription {
        tier: "pro".to_string(),
    }
}

fn free() -> Subscription {
    Subscription {
        tier: "free".to_string(),
    }
}

/// The write-back after a miss is spawned; yield until it lands.
async fn wait_for_writeback(store: &InMemoryStore, key: &str) {
    for _ in 0..100 {
        if store.contains(key) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("write-back for {key} did not complete");
}

#[tokio::test]
async fn hit_avoids_second_fetch() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let key = keys::subscription("u1");
    let fetches = AtomicU32::new(0);

    let fetch = || {
        fetches.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, UpstreamStatus>(pro()) }
    };

    let first: Subscription = cache
        .get_or_fetch(&key, Duration::from_secs(1800), fetch)
        .await
        .unwrap();
    assert_eq!(first, pro());
    wait_for_writeback(&store, &key).await;

    let second: Subscription = cache
        .get_or_fetch(&key, Duration::from_secs(1800), || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, UpstreamStatus>(free()) }
        })
        .await
        .unwrap();

    assert_eq!(second, pro());
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(cache.metrics().cache_hits(), 1);
    assert_eq!(cache.metrics().cache_misses(), 1);
}

#[tokio::test]
async fn expired_entry_is_a_miss() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let key = keys::user_prefs("u1");
    let fetches = AtomicU32::new(0);

    let _: String = cache
        .get_or_fetch(&key, Duration::from_secs(60), || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, UpstreamStatus>("dark-mode".to_string()) }
        })
        .await
        .unwrap();
    wait_for_writeback(&store, &key).await;

    clock.advance(Duration::from_secs(61));

    let value: String = cache
        .get_or_fetch(&key, Duration::from_secs(60), || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, UpstreamStatus>("light-mode".to_string()) }
        })
        .await
        .unwrap();

    assert_eq!(value, "light-mode");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unavailable_store_degrades_to_fetch() {
    let cache = ReadThroughCache::new(Arc::new(FailingStore::new()));
    let fetches = AtomicU32::new(0);

    for _ in 0..3 {
        let value: Subscription = cache
            .get_or_fetch("subscription:u9", Duration::from_secs(60), || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, UpstreamStatus>(pro()) }
            })
            .await
            .unwrap();
        assert_eq!(value, pro());
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(cache.metrics().cache_errors(), 3);
}

#[tokio::test]
async fn disabled_cache_is_a_pass_through() {
    let cache = ReadThroughCache::disabled();
    assert!(!cache.is_enabled());
    let fetches = AtomicU32::new(0);

    let value: u32 = cache
        .get_or_fetch("chat:c1", Duration::from_secs(60), || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, UpstreamStatus>(7) }
        })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(cache.invalidate("chat:c1").await, 0);
}

#[tokio::test]
async fn fetch_error_propagates_unchanged() {
    let clock = Arc::new(MockClock::new(0));
    let cache = ReadThroughCache::new(Arc::new(InMemoryStore::new(clock)));

    let result: Result<Subscription, UpstreamStatus> = cache
        .get_or_fetch("subscription:u1", Duration::from_secs(60), || async {
            Err(UpstreamStatus(500))
        })
        .await;

    assert_eq!(result.unwrap_err(), UpstreamStatus(500));
}

// Two reads within the TTL observe the first snapshot; the fetch runs once.
#[tokio::test]
async fn subscription_snapshot_cached_for_ttl() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let key = keys::subscription("u1");
    let fetches = AtomicU32::new(0);

    let snapshots = [pro(), free()];
    for expected in [pro(), pro()] {
        let value: Subscription = cache
            .get_or_fetch(&key, Duration::from_secs(1800), || {
                let n = fetches.fetch_add(1, Ordering::SeqCst) as usize;
                let snapshot = snapshots[n].clone();
                async move { Ok::<_, UpstreamStatus>(snapshot) }
            })
            .await
            .unwrap();
        assert_eq!(value, expected);
        wait_for_writeback(&store, &key).await;
        clock.advance(Duration::from_secs(60));
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalidation_forces_refetch() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let key = keys::voices("u1");
    let fetches = AtomicU32::new(0);

    let fetch = || {
        fetches.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, UpstreamStatus>(vec!["voice-a".to_string()]) }
    };

    let _: Vec<String> = cache
        .get_or_fetch(&key, Duration::from_secs(600), fetch)
        .await
        .unwrap();
    wait_for_writeback(&store, &key).await;

    assert_eq!(cache.invalidate(&key).await, 1);

    let _: Vec<String> = cache
        .get_or_fetch(&key, Duration::from_secs(600), || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, UpstreamStatus>(vec!["voice-b".to_string()]) }
        })
        .await
        .unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pattern_invalidation_removes_all_matches() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let ttl = Duration::from_secs(600);

    for user in ["u1", "u2", "u3"] {
        let key = keys::chats(user);
        let _: u32 = cache
            .get_or_fetch(&key, ttl, || async { Ok::<_, UpstreamStatus>(1) })
            .await
            .unwrap();
        wait_for_writeback(&store, &key).await;
    }
    let other = keys::contacts("u1");
    let _: u32 = cache
        .get_or_fetch(&other, ttl, || async { Ok::<_, UpstreamStatus>(2) })
        .await
        .unwrap();
    wait_for_writeback(&store, &other).await;

    assert_eq!(cache.invalidate_matching("chats:*").await, 3);
    assert!(store.contains(&other));
}

#[tokio::test]
async fn corrupt_entry_discarded_and_refetched() {
    let clock = Arc::new(MockClock::new(0));
    let store = InMemoryStore::new(clock.clone());
    let cache = ReadThroughCache::new(Arc::new(store.clone()));
    let key = keys::chat("c1");

    store.insert_raw(&key, b"not json at all".to_vec(), Duration::from_secs(600));

    let value: Subscription = cache
        .get_or_fetch(&key, Duration::from_secs(600), || async {
            Ok::<_, UpstreamStatus>(pro())
        })
        .await
        .unwrap();

    assert_eq!(value, pro());
    // The fresh value replaces the corrupt bytes.
    wait_for_writeback(&store, &key).await;
    let second: Subscription = cache
        .get_or_fetch(&key, Duration::from_secs(600), || async {
            Ok::<_, UpstreamStatus>(free())
        })
        .await
        .unwrap();
    assert_eq!(second, pro());
}
