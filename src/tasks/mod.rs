//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - TTL Prune: Removes expired cache entries at configured intervals

mod prune;

pub use prune::{spawn_configured_prune_task, spawn_prune_task};
