//! memo_cache - An in-process key/value cache
//!
//! Provides LRU eviction, TTL expiration, lifecycle hooks, wildcard
//! invalidation, single-flight fetching and a memoizing function wrapper.

pub mod cache;
pub mod config;
pub mod error;
pub mod memoize;
pub mod tasks;

pub use cache::{Cache, CacheHooks, CacheStats, DeleteSource, ExpireSource, MissReason};
pub use config::CacheConfig;
pub use error::{CacheError, MemoizeError, Result};
pub use memoize::{memoize, MemoizeOptions, Memoized};
pub use tasks::{spawn_configured_prune_task, spawn_prune_task};
