//! Integration Tests for Memoized Functions
//!
//! Covers key derivation, error handling and cache sharing through the
//! public API.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use memo_cache::cache::ManualClock;
use memo_cache::{memoize, CacheConfig, CacheHooks, MemoizeError, MemoizeOptions, Memoized};
use serde::Serialize;

#[derive(Serialize)]
struct Search {
    term: String,
    page: u32,
}

#[test]
fn test_struct_arguments_make_stable_keys() {
    let search = memoize("search", |q: &Search| {
        Ok::<_, Infallible>(format!("{}#{}", q.term, q.page))
    });
    let query = Search {
        term: "rust".to_string(),
        page: 2,
    };

    assert_eq!(
        search.key_for(&query).unwrap(),
        r#"search:{"term":"rust","page":2}"#
    );
    assert_eq!(search.call(&query).unwrap(), "rust#2");
    assert_eq!(search.call(&query).unwrap(), "rust#2");
    assert_eq!(search.cache().stats().hits, 1);
}

#[test]
fn test_memoized_ttl_recomputes_after_expiry() {
    let clock = Arc::new(ManualClock::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let options = MemoizeOptions::new()
        .config(CacheConfig::new(10, 1_000).unwrap())
        .clock(clock.clone());
    let now = Memoized::new(
        "now",
        move |_: &()| Ok::<_, Infallible>(counter.fetch_add(1, Ordering::SeqCst)),
        options,
    );

    assert_eq!(now.call(&()).unwrap(), 0);
    clock.advance(1_000);
    assert_eq!(now.call(&()).unwrap(), 0);
    clock.advance(1);
    assert_eq!(now.call(&()).unwrap(), 1);
    assert_eq!(now.cache().stats().expirations, 1);
}

#[test]
fn test_hooks_observe_memoized_calls() {
    let sets = Arc::new(Mutex::new(Vec::new()));
    let sink = sets.clone();
    let options = MemoizeOptions::new()
        .hooks(CacheHooks::new().on_set(move |key, value: &u32, is_update| {
            sink.lock().unwrap().push((key.to_string(), *value, is_update));
        }));
    let square = Memoized::new("square", |n: &u32| Ok::<_, Infallible>(n * n), options);

    square.call(&3).unwrap();
    square.call(&3).unwrap();

    assert_eq!(
        *sets.lock().unwrap(),
        vec![("square:3".to_string(), 9, false)]
    );
}

#[test]
fn test_call_error_is_returned_unchanged() {
    let parse = memoize("parse", |raw: &String| raw.parse::<u8>());

    let err = parse.call(&"300".to_string()).unwrap_err();

    let call_err = err.into_call_error().expect("function error");
    assert_eq!(call_err.to_string(), "number too large to fit in target type");
    assert!(parse.cache().is_empty());
}

#[test]
fn test_invalidating_memoized_results() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetch = memoize("user", move |id: &u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Infallible>(format!("user-{id}"))
    });

    fetch.call(&1).unwrap();
    fetch.call(&2).unwrap();
    assert_eq!(fetch.cache().delete_by_magic_string("user:*"), 2);

    fetch.call(&1).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

// == Async ==

#[tokio::test]
async fn test_call_async_caches_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let lookup = Memoized::new_async(
        "lookup",
        move |id: &u32| {
            let id = *id;
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, Infallible>(id * 10)
            }
        },
        MemoizeOptions::new(),
    );

    assert_eq!(lookup.call_async(&4).await.unwrap(), 40);
    assert_eq!(lookup.call_async(&4).await.unwrap(), 40);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_call_async_never_caches_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flaky = Memoized::new_async(
        "flaky",
        move |_: &()| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow::anyhow!("first attempt fails"))
                } else {
                    Ok(attempt)
                }
            }
        },
        MemoizeOptions::new(),
    );

    let err = flaky.call_async(&()).await.unwrap_err();
    assert!(matches!(err, MemoizeError::Call(_)));
    assert!(flaky.cache().is_empty());

    assert_eq!(flaky.call_async(&()).await.unwrap(), 1);
    assert_eq!(flaky.call_async(&()).await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_call_async_shared_across_tasks() {
    let double = Memoized::new_async(
        "double",
        |n: &u64| {
            let n = *n;
            async move { Ok::<_, Infallible>(n * 2) }
        },
        MemoizeOptions::new().hash_keys(true),
    );

    let handles: Vec<_> = (0..4u64)
        .map(|n| {
            let double = double.clone();
            tokio::spawn(async move { double.call_async(&n).await.unwrap() })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results, vec![0, 2, 4, 6]);
    assert_eq!(double.cache().len(), 4);
}
