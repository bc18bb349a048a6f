//! Copy-on-write registry semantics, exercised with cheap values

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use northfoot_common::LoggingTransformer;
use northfoot_signer::{Registry, SignerError};
use tokio::sync::Barrier;

#[tokio::test]
async fn test_miss_loads_once_then_hits() {
    LoggingTransformer::init_test();

    let registry: Registry<String> = Registry::new();
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    for _ in 0..3 {
        let value = registry
            .get_or_load(1, |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("signer-1".to_string())
            })
            .await
            .expect("load");
        assert_eq!(value.as_str(), "signer-1");
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(registry.contains(1));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_hit_returns_same_instance() {
    let registry: Registry<String> = Registry::new();
    let first = registry
        .get_or_load(5, |_| async { Ok("five".to_string()) })
        .await
        .expect("load");
    let second = registry
        .get_or_load(5, |_| async { Ok("other".to_string()) })
        .await
        .expect("hit");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &registry.get(5).expect("cached")));
}

#[tokio::test]
async fn test_failed_load_leaves_snapshot_untouched() {
    let registry: Registry<String> = Registry::new();
    registry
        .get_or_load(1, |_| async { Ok("one".to_string()) })
        .await
        .expect("load");

    let before = registry.snapshot();
    let err = registry
        .get_or_load(2, |_| async { Err(SignerError::NotFound { id: 2 }) })
        .await
        .unwrap_err();
    let after = registry.snapshot();

    assert!(matches!(err, SignerError::NotFound { id: 2 }));
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!registry.contains(2));
}

#[tokio::test]
async fn test_invalidate_evicts_but_holders_keep_value() {
    let registry: Registry<String> = Registry::new();
    let held = registry
        .get_or_load(3, |_| async { Ok("three".to_string()) })
        .await
        .expect("load");

    assert!(registry.invalidate(3));
    assert!(registry.get(3).is_none());
    assert!(registry.is_empty());
    assert_eq!(held.as_str(), "three");

    // Next access reloads a fresh instance
    let reloaded = registry
        .get_or_load(3, |_| async { Ok("three".to_string()) })
        .await
        .expect("reload");
    assert!(!Arc::ptr_eq(&held, &reloaded));
}

#[tokio::test]
async fn test_invalidate_absent_id_publishes_nothing() {
    let registry: Registry<String> = Registry::new();
    let before = registry.snapshot();

    assert!(!registry.invalidate(99));
    assert!(Arc::ptr_eq(&before, &registry.snapshot()));
}

#[tokio::test]
async fn test_snapshot_is_isolated_from_later_writes() {
    let registry: Registry<String> = Registry::new();
    registry
        .get_or_load(1, |_| async { Ok("one".to_string()) })
        .await
        .expect("load");

    let snapshot = registry.snapshot();
    registry
        .get_or_load(2, |_| async { Ok("two".to_string()) })
        .await
        .expect("load");
    registry.invalidate(1);

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains_key(&1));
    assert!(!registry.contains(1));
    assert!(registry.contains(2));
}

// Concurrent misses for one id are not merged: both loaders run and the
// later publish replaces the earlier one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_are_not_deduplicated() {
    let registry: Arc<Registry<String>> = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(2));
    let calls = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..2)
        .map(|n| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                registry
                    .get_or_load(7, |_| async move {
                        // Both callers must be past the miss before either publishes
                        barrier.wait().await;
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(format!("loader-{n}"))
                    })
                    .await
            })
        })
        .collect();

    let mut values = Vec::new();
    for task in tasks {
        values.push(task.await.expect("task").expect("load"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&values[0], &values[1]));

    let cached = registry.get(7).expect("published");
    assert!(values.iter().any(|value| Arc::ptr_eq(value, &cached)));
    assert_eq!(registry.len(), 1);
}

// Entries are published in ascending id order, so any snapshot holding id n
// must also hold every id below n; a torn publish would break that.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_partial_publish() {
    const ENTRIES: u64 = 200;

    let registry: Arc<Registry<u64>> = Arc::new(Registry::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut last_len = 0;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = registry.snapshot();
                    let len = snapshot.len();
                    assert!(len >= last_len, "snapshot shrank from {last_len} to {len}");
                    for id in 1..=len as u64 {
                        let value = snapshot.get(&id).expect("prefix must be complete");
                        assert_eq!(**value, id * 10);
                    }
                    last_len = len;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for id in 1..=ENTRIES {
        registry
            .get_or_load(id, |_| async move { Ok(id * 10) })
            .await
            .expect("load");
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        reader.await.expect("reader panicked");
    }
    assert_eq!(registry.len(), ENTRIES as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invalidations_converge() {
    let registry: Arc<Registry<u64>> = Arc::new(Registry::new());
    for id in 1..=64 {
        registry
            .get_or_load(id, |_| async move { Ok(id) })
            .await
            .expect("load");
    }

    let tasks: Vec<_> = (1..=64u64)
        .map(|id| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { (id, registry.invalidate(id)) })
        })
        .collect();

    for task in tasks {
        let (id, removed) = task.await.expect("task");
        assert!(removed, "id {id} should have been present");
    }
    assert!(registry.is_empty());
}
