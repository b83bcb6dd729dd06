//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction, lifecycle
//! hooks, wildcard invalidation and single-flight fetching.

mod entry;
mod flight;
mod handle;
mod hooks;
mod lru;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, Clock, ManualClock, SystemClock};
pub use flight::{Flight, InFlight, LeaderTicket};
pub use handle::Cache;
pub use hooks::{CacheEvent, CacheHooks, DeleteSource, ExpireSource, MissReason};
pub(crate) use lru::LruTracker;
pub use pattern::WildcardPattern;
pub use stats::CacheStats;
pub use store::CacheStore;
