//! TTL Prune Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that prunes `cache` every `interval`.
///
/// The task runs until aborted through the returned handle. Each run takes
/// the cache lock only for the duration of one `prune()`.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(CacheConfig::default());
/// let prune_handle = spawn_prune_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task<V>(cache: Cache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL prune task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.prune();
            if removed > 0 {
                info!("TTL prune: removed {} expired entries", removed);
            } else {
                debug!("TTL prune: no expired entries found");
            }
        }
    })
}

/// Spawns the prune task at the cache's configured interval, if it has one.
///
/// Returns `None` when the interval or the TTL is zero.
pub fn spawn_configured_prune_task<V>(cache: &Cache<V>) -> Option<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    let config = cache.config();
    config.ttl()?;
    let interval = config.prune_interval()?;
    Some(spawn_prune_task(cache.clone(), interval))
}
