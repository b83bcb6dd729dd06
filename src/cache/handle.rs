//! Cache Handle Module
//!
//! The public, cloneable cache. Wraps the store in a lock, dispatches hook
//! events once the lock is released, and coordinates single-flight fetches.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{
    CacheHooks, CacheStats, CacheStore, Clock, Flight, InFlight, MissReason, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

struct Shared<V> {
    store: Mutex<CacheStore<V>>,
    hooks: CacheHooks<V>,
    in_flight: InFlight<V>,
    config: CacheConfig,
}

// == Cache ==
/// An in-memory key/value cache with LRU eviction, TTL expiration, lifecycle
/// hooks and single-flight fetching.
///
/// Clones are cheap and share the same underlying state. Independent caches
/// share nothing.
///
/// ```
/// use memo_cache::{Cache, CacheConfig};
///
/// let cache = Cache::new(CacheConfig::new(2, 0).unwrap());
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.get("c"), Some(3));
/// assert_eq!(cache.stats().evictions, 1);
/// ```
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.shared.config)
            .field("hooks", &self.shared.hooks)
            .field("in_flight", &self.shared.in_flight)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> Cache<V> {
    // == Constructors ==
    /// Creates a cache without hooks, timed by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_hooks(config, CacheHooks::new())
    }

    /// Creates a cache from raw signed settings.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidConfig` if either value is negative.
    pub fn try_new(max_size: i64, ttl_ms: i64) -> Result<Self> {
        CacheConfig::new(max_size, ttl_ms).map(Self::new)
    }

    /// Creates a cache that fires `hooks`, timed by the system clock.
    pub fn with_hooks(config: CacheConfig, hooks: CacheHooks<V>) -> Self {
        Self::with_clock(config, hooks, Arc::new(SystemClock))
    }

    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, hooks: CacheHooks<V>, clock: Arc<dyn Clock>) -> Self {
        let store = CacheStore::new(&config, clock).with_events(!hooks.is_empty());
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(store),
                hooks,
                in_flight: InFlight::new(),
                config,
            }),
        }
    }

    // == Config ==
    /// The settings this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Runs `op` under the store lock, then fires the hooks it triggered.
    fn with_store<R>(&self, op: impl FnOnce(&mut CacheStore<V>) -> R) -> R {
        let (result, events) = {
            let mut store = self.shared.store.lock();
            let result = op(&mut store);
            (result, store.take_events())
        };
        self.shared.hooks.dispatch_all(&events);
        result
    }

    // == Lookups ==
    /// Returns the value for `key`, or `None` on a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        self.with_store(|store| store.get(key))
    }

    /// Reports whether `key` holds a live entry, without counting a hit or
    /// miss and without promoting it.
    pub fn has(&self, key: &str) -> bool {
        self.with_store(|store| store.has(key))
    }

    // == Writes ==
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// Overwriting never evicts; inserting a new key into a full cache evicts
    /// the least recently used entry first.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.with_store(|store| store.set(key, value));
    }

    // == Get Or Set ==
    /// Returns the cached value for `key`, or runs `fetcher` to produce it.
    ///
    /// Concurrent callers for the same missing key share a single fetcher
    /// run and all observe its outcome, including across threads. A
    /// successful result is cached; a failure is not, so the next call
    /// fetches again.
    ///
    /// # Errors
    /// `CacheError::Fetch` carrying the fetcher's error, shared by every
    /// joined caller, or `CacheError::FetchAbandoned` if the leading call
    /// was dropped before its fetcher finished.
    pub async fn get_or_set<F, Fut>(&self, key: &str, fetcher: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if self.has(key) {
            if let Some(value) = self.get(key) {
                return Ok(value);
            }
        }

        match self.shared.in_flight.join_or_lead(key) {
            Flight::Follower(receiver) => {
                debug!("Joining in-flight fetch for key {:?}", key);
                InFlight::wait(receiver, key).await
            }
            Flight::Leader(ticket) => {
                // A leader stores its value before unregistering, so one that
                // finished after the lookup above is visible here.
                if self.has(key) {
                    if let Some(value) = self.get(key) {
                        ticket.settle(Ok(value.clone()));
                        return Ok(value);
                    }
                }

                self.with_store(|store| store.record_miss(key, MissReason::NotFound));
                debug!("Fetching key {:?}", key);

                let outcome = fetcher().await.map_err(|e| CacheError::Fetch {
                    key: key.to_string(),
                    cause: Arc::new(e),
                });
                if let Ok(value) = &outcome {
                    self.set(key, value.clone());
                }
                ticket.settle(outcome.clone());
                outcome
            }
        }
    }

    // == Deletes ==
    /// Removes `key`. Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.with_store(|store| store.delete(key))
    }

    /// Same as [`Cache::delete`], for callers that want an awaitable API.
    pub async fn delete_async(&self, key: &str) -> bool {
        self.delete(key)
    }

    // == Clear ==
    /// Removes every entry, firing the delete hook for each.
    pub fn clear(&self) {
        self.with_store(|store| store.clear());
    }

    // == Pattern Deletes ==
    /// Removes every key starting with `prefix`; `""` removes everything.
    pub fn delete_by_prefix(&self, prefix: &str) -> usize {
        self.with_store(|store| store.delete_by_prefix(prefix))
    }

    /// Removes every key matching a `*` wildcard pattern anchored at both
    /// ends. All other characters are literal; `""` removes nothing.
    pub fn delete_by_magic_string(&self, pattern: &str) -> usize {
        self.with_store(|store| store.delete_by_magic_string(pattern))
    }

    // == Listing ==
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.with_store(|store| store.len())
    }

    /// True when no live entry remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.with_store(|store| store.keys())
    }

    /// Live values, least recently used first.
    pub fn values(&self) -> Vec<V> {
        self.with_store(|store| store.values())
    }

    /// Live key/value pairs, least recently used first.
    pub fn entries(&self) -> Vec<(String, V)> {
        self.with_store(|store| store.entries())
    }

    // == Stats ==
    /// A detached snapshot of the counters plus the live size.
    pub fn stats(&self) -> CacheStats {
        self.with_store(|store| store.stats())
    }

    /// Zeroes hits, misses, evictions and expirations. Entries are kept.
    pub fn reset_stats(&self) {
        self.with_store(|store| store.reset_stats());
    }

    // == Prune ==
    /// Removes expired entries, returning how many were removed.
    pub fn prune(&self) -> usize {
        self.with_store(|store| store.prune())
    }

    /// Number of `get_or_set` fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.len()
    }
}
