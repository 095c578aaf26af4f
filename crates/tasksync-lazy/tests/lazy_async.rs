//! Integration tests for `LazyAsync`.
//!
//! These tests cover the observable contract: first-read loading, change
//! notifications, failure capture and reset-driven reloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rstest::rstest;
use tasksync_lazy::{CachePhase, LazyAsync, ResolveError};
use tokio::sync::broadcast::error::TryRecvError;

/// Builds a cache whose producer counts its invocations and returns a
/// caller-chosen result per call.
fn scripted(
    calls: &Arc<AtomicUsize>,
    results: Vec<Result<&'static str, &'static str>>,
) -> LazyAsync<String, String> {
    let calls = Arc::clone(calls);
    let results = Arc::new(results);
    LazyAsync::new(
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            let result = results[call.min(results.len() - 1)];
            async move {
                tokio::task::yield_now().await;
                result.map(str::to_string).map_err(str::to_string)
            }
        },
        "initial".to_string(),
    )
}

#[tokio::test]
async fn read_before_resolution_returns_initial_then_one_notification() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = scripted(&calls, vec![Ok("produced")]);
    let mut changes = cache.subscribe();

    assert_eq!(cache.read(), Ok("initial".to_string()));
    assert_eq!(cache.phase(), CachePhase::Loading);

    assert_eq!(cache.resolve().await, Ok("produced".to_string()));
    assert_eq!(cache.read(), Ok("produced".to_string()));

    assert_eq!(changes.try_recv(), Ok("produced".to_string()));
    assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));
}

#[rstest]
#[case::from_ready(vec![Ok("first"), Ok("second")])]
#[case::from_failed(vec![Err("broken"), Ok("second")])]
#[tokio::test]
async fn reset_reloads_exactly_once(#[case] results: Vec<Result<&'static str, &'static str>>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = scripted(&calls, results);

    let _ = cache.resolve().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut changes = cache.subscribe();
    cache.reset();

    assert_eq!(cache.phase(), CachePhase::Idle);
    assert_eq!(cache.generation(), 1);
    assert_eq!(changes.try_recv(), Ok("initial".to_string()));

    assert_eq!(cache.read(), Ok("initial".to_string()));
    assert_eq!(cache.read(), Ok("initial".to_string()));
    assert_eq!(cache.resolve().await, Ok("second".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failure_is_sticky_until_reset() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = scripted(&calls, vec![Err("no such file"), Ok("recovered")]);
    let mut changes = cache.subscribe();

    assert_eq!(
        cache.resolve().await,
        Err(ResolveError::Failed("no such file".to_string()))
    );
    for _ in 0..3 {
        assert_eq!(cache.read(), Err("no such file".to_string()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));

    cache.reset();
    assert_eq!(cache.resolve().await, Ok("recovered".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_share_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = {
        let calls = Arc::clone(&calls);
        LazyAsync::<u64, String>::new(
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(7)
                }
            },
            0,
        )
    };

    let readers: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.resolve().await })
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.await.unwrap(), Ok(7));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_producer_returns_cache_to_idle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = {
        let calls = Arc::clone(&calls);
        LazyAsync::<u32, String>::new(
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(call > 0, "first load blows up");
                    Ok(5)
                }
            },
            0,
        )
    };

    assert_eq!(
        cache.resolve().await,
        Err(ResolveError::Abandoned { generation: 0 })
    );
    assert_eq!(cache.phase(), CachePhase::Idle);

    assert_eq!(cache.resolve().await, Ok(5));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
