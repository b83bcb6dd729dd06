//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.
//!
//! The store is a plain `&mut self` state machine. It never runs hooks itself:
//! when event recording is enabled it buffers [`CacheEvent`]s that the owning
//! handle drains and dispatches after releasing its lock.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{
    CacheEntry, CacheEvent, CacheStats, Clock, DeleteSource, ExpireSource, LruTracker,
    MissReason, WildcardPattern,
};
use crate::config::CacheConfig;

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, 0 = unbounded
    max_size: usize,
    /// Entry lifetime in milliseconds, 0 = never expires
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
    /// Buffered lifecycle events awaiting dispatch
    events: Vec<CacheEvent<V>>,
    record_events: bool,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore from a validated config.
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_size: config.max_size,
            ttl_ms: config.ttl_ms,
            clock,
            events: Vec::new(),
            record_events: false,
        }
    }

    /// Enables or disables event buffering.
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.record_events = enabled;
        self
    }

    /// Drains buffered events in the order they occurred.
    pub fn take_events(&mut self) -> Vec<CacheEvent<V>> {
        std::mem::take(&mut self.events)
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most recently used.
    ///
    /// Expired entries are removed and counted as both an expiration and a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired(self.ttl_ms, now));

        match expired {
            None => {
                self.record_miss(key, MissReason::NotFound);
                None
            }
            Some(true) => {
                self.expire(key, ExpireSource::Get);
                self.record_miss(key, MissReason::Expired);
                None
            }
            Some(false) => {
                let value = self.entries[key].value.clone();
                self.lru.touch(key);
                self.stats.record_hit();
                if self.record_events {
                    self.events.push(CacheEvent::Hit {
                        key: key.to_string(),
                        value: value.clone(),
                    });
                }
                Some(value)
            }
        }
    }

    // == Has ==
    /// Reports whether a live entry exists for `key`.
    ///
    /// Does not promote the entry or touch hit/miss counters, but does remove
    /// an expired entry it runs into.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired(self.ttl_ms, now));

        match expired {
            None => false,
            Some(true) => {
                self.expire(key, ExpireSource::Has);
                false
            }
            Some(false) => true,
        }
    }

    // == Set ==
    /// Stores a key-value pair, stamping it with the current time.
    ///
    /// Overwriting an existing key moves it to most recently used and never
    /// evicts. Inserting a new key into a full store evicts the least
    /// recently used entry first.
    pub fn set(&mut self, key: String, value: V) {
        let is_update = self.entries.contains_key(&key);

        if !is_update && self.max_size > 0 && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let now = self.clock.now_ms();
        let event_value = self.record_events.then(|| value.clone());
        self.lru.touch(&key);
        self.entries.insert(key.clone(), CacheEntry::new(value, now));
        debug_assert_eq!(self.lru.len(), self.entries.len());

        if let Some(value) = event_value {
            self.events.push(CacheEvent::Set {
                key,
                value,
                is_update,
            });
        }
    }

    // == Record Miss ==
    /// Counts a miss for `key` without looking anything up.
    pub fn record_miss(&mut self, key: &str, reason: MissReason) {
        self.stats.record_miss();
        if self.record_events {
            self.events.push(CacheEvent::Miss {
                key: key.to_string(),
                reason,
            });
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key, DeleteSource::Delete)
    }

    // == Clear ==
    /// Removes every entry, reporting each as deleted.
    pub fn clear(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        if self.record_events {
            for key in self.lru.iter() {
                if let Some(entry) = entries.get(key) {
                    self.events.push(CacheEvent::Delete {
                        key: key.to_string(),
                        value: entry.value.clone(),
                        source: DeleteSource::Clear,
                    });
                }
            }
        }
        self.lru.clear();
        debug!("Cleared {} entries", entries.len());
    }

    // == Delete By Prefix ==
    /// Removes every entry whose key starts with `prefix`. An empty prefix
    /// matches everything.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let removed =
            self.delete_where(DeleteSource::DeleteByPrefix, |key| key.starts_with(prefix));
        debug!("Deleted {} entries with prefix {:?}", removed, prefix);
        removed
    }

    // == Delete By Magic String ==
    /// Removes every entry whose whole key matches a `*` wildcard pattern.
    /// An empty pattern matches nothing.
    pub fn delete_by_magic_string(&mut self, pattern: &str) -> usize {
        let Some(compiled) = WildcardPattern::compile(pattern) else {
            return 0;
        };
        let removed =
            self.delete_where(DeleteSource::DeleteByMagicString, |key| compiled.matches(key));
        debug!("Deleted {} entries matching {:?}", removed, pattern);
        removed
    }

    // == Prune ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed; always 0 when TTL is disabled.
    pub fn prune(&mut self) -> usize {
        if self.ttl_ms == 0 {
            return 0;
        }

        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .lru
            .iter()
            .filter(|&key| {
                self.entries
                    .get(key)
                    .is_some_and(|entry| entry.is_expired(self.ttl_ms, now))
            })
            .map(str::to_string)
            .collect();

        for key in &expired {
            self.expire(key, ExpireSource::Prune);
        }
        expired.len()
    }

    // == Length ==
    /// Returns the number of live entries, pruning expired ones first.
    pub fn len(&mut self) -> usize {
        self.prune();
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Live keys from least to most recently used.
    pub fn keys(&mut self) -> Vec<String> {
        self.prune();
        self.lru.iter().map(str::to_string).collect()
    }

    /// Live values from least to most recently used.
    pub fn values(&mut self) -> Vec<V> {
        self.prune();
        self.lru
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Live key/value pairs from least to most recently used.
    pub fn entries(&mut self) -> Vec<(String, V)> {
        self.prune();
        self.lru
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| (key.to_string(), entry.value.clone()))
            })
            .collect()
    }

    // == Stats ==
    /// Returns a snapshot of the counters with a freshly pruned size.
    pub fn stats(&mut self) -> CacheStats {
        let size = self.len();
        self.stats.snapshot(size)
    }

    /// Zeroes hit, miss, eviction and expiration counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn evict_oldest(&mut self) {
        let Some(key) = self.lru.evict_oldest() else {
            return;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.stats.record_eviction();
            debug!("Evicted least recently used key {:?}", key);
            if self.record_events {
                self.events.push(CacheEvent::Evict {
                    key,
                    value: entry.value,
                });
            }
        }
    }

    fn expire(&mut self, key: &str, source: ExpireSource) {
        if let Some(entry) = self.entries.remove(key) {
            self.lru.remove(key);
            self.stats.record_expiration();
            debug!("Expired key {:?} (found by {})", key, source);
            if self.record_events {
                self.events.push(CacheEvent::Expire {
                    key: key.to_string(),
                    value: entry.value,
                    source,
                });
            }
        }
    }

    fn remove(&mut self, key: &str, source: DeleteSource) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        self.lru.remove(key);
        if self.record_events {
            self.events.push(CacheEvent::Delete {
                key: key.to_string(),
                value: entry.value,
                source,
            });
        }
        true
    }

    fn delete_where(&mut self, source: DeleteSource, mut matches: impl FnMut(&str) -> bool) -> usize {
        let doomed: Vec<String> = self
            .lru
            .iter()
            .filter(|&key| matches(key))
            .map(str::to_string)
            .collect();

        for key in &doomed {
            self.remove(key, source);
        }
        doomed.len()
    }
}
