//! Configuration Module
//!
//! Validated cache construction parameters, loadable from environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

/// Default maximum number of entries.
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default time-to-live in milliseconds (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Cache configuration parameters.
///
/// A zero `max_size` disables eviction, a zero `ttl_ms` disables expiration
/// and a zero `prune_interval_ms` disables background pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Entry lifetime in milliseconds, measured from the last write
    pub ttl_ms: u64,
    /// Background prune task interval in milliseconds
    pub prune_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a validated config from signed inputs.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidConfig` if either value is negative.
    pub fn new(max_size: i64, ttl_ms: i64) -> Result<Self> {
        Ok(Self {
            max_size: to_usize("maxSize", non_negative("maxSize", max_size)?)?,
            ttl_ms: non_negative("ttl", ttl_ms)?,
            prune_interval_ms: 0,
        })
    }

    /// Sets the background prune interval.
    pub fn with_prune_interval_ms(mut self, prune_interval_ms: u64) -> Self {
        self.prune_interval_ms = prune_interval_ms;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 100)
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `CACHE_PRUNE_INTERVAL_MS` - Prune task interval (default: 0, disabled)
    ///
    /// Unset variables fall back to their defaults; unparsable or negative
    /// values are rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] but reads from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str, default: u64| -> Result<u64> {
            match lookup(name) {
                None => Ok(default),
                Some(raw) => {
                    let parsed: i64 = raw.trim().parse().map_err(|_| {
                        warn!("Rejecting {}={:?}: not an integer", name, raw);
                        CacheError::InvalidConfig(format!("{} must be an integer, got {:?}", name, raw))
                    })?;
                    non_negative(name, parsed).map_err(|e| {
                        warn!("Rejecting {}={:?}: negative", name, raw);
                        e
                    })
                }
            }
        };

        Ok(Self {
            max_size: to_usize("CACHE_MAX_SIZE", read("CACHE_MAX_SIZE", defaults.max_size as u64)?)?,
            ttl_ms: read("CACHE_TTL_MS", defaults.ttl_ms)?,
            prune_interval_ms: read("CACHE_PRUNE_INTERVAL_MS", defaults.prune_interval_ms)?,
        })
    }

    /// Entry lifetime, or `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_ms > 0).then(|| Duration::from_millis(self.ttl_ms))
    }

    /// Prune task interval, or `None` when background pruning is disabled.
    pub fn prune_interval(&self) -> Option<Duration> {
        (self.prune_interval_ms > 0).then(|| Duration::from_millis(self.prune_interval_ms))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl_ms: DEFAULT_TTL_MS,
            prune_interval_ms: 0,
        }
    }
}

fn non_negative(name: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        CacheError::InvalidConfig(format!("{} must be non-negative, got {}", name, value))
    })
}

fn to_usize(name: &str, value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        CacheError::InvalidConfig(format!("{} of {} does not fit this platform", name, value))
    })
}
