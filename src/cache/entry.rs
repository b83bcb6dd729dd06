//! Cache Entry Module
//!
//! Defines individual cache entries and the time source used to age them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

// == Cache Entry ==
/// A stored value together with its last-write timestamp.
///
/// Presence of a `CacheEntry` is what makes a key "present"; the value itself
/// may be anything, including `None` when `V` is an `Option`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation or last-write timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with `now_ms`.
    pub fn new(value: V, now_ms: u64) -> Self {
        Self {
            value,
            timestamp: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the last write.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl_ms`.
    ///
    /// A zero TTL never expires. An entry aged exactly `ttl_ms` is still valid;
    /// only a strictly greater age expires it.
    pub fn is_expired(&self, ttl_ms: u64, now_ms: u64) -> bool {
        ttl_ms > 0 && self.age_ms(now_ms) > ttl_ms
    }
}

// == Clock ==
/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        current_timestamp_ms()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Jumps to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    // Clamp pre-epoch clocks to zero rather than wrapping.
    Utc::now().timestamp_millis().max(0) as u64
}
