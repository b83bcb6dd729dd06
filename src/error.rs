//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// The enum is `Clone` so a single fetch failure can be handed to every
/// caller that joined the same in-flight fetch.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `get_or_set` fetcher returned an error
    #[error("Fetch failed for key {key}: {cause}")]
    Fetch {
        key: String,
        cause: Arc<anyhow::Error>,
    },

    /// The leading `get_or_set` call was dropped before its fetcher settled
    #[error("Fetch abandoned for key: {0}")]
    FetchAbandoned(String),

    /// A memoized call could not derive its cache key
    #[error("Key derivation failed: {0}")]
    KeyDerivation(Arc<anyhow::Error>),
}

impl CacheError {
    /// Returns the shared fetcher error, if this is a fetch failure.
    pub fn fetch_cause(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            CacheError::Fetch { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

// == Memoize Error Enum ==
/// Error returned by a memoized call.
///
/// `Call` carries the wrapped function's own error unchanged.
#[derive(Error, Debug)]
pub enum MemoizeError<E> {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Memoized call failed: {0}")]
    Call(E),
}

impl<E> MemoizeError<E> {
    /// Unwraps the wrapped function's error, if that is what failed.
    pub fn into_call_error(self) -> Option<E> {
        match self {
            MemoizeError::Call(err) => Some(err),
            MemoizeError::Cache(_) => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = CacheError::Fetch {
            key: "user:1".to_string(),
            cause: Arc::new(anyhow::anyhow!("backend down")),
        };
        assert_eq!(err.to_string(), "Fetch failed for key user:1: backend down");
        assert!(err.fetch_cause().is_some());
    }

    #[test]
    fn test_clone_shares_fetch_cause() {
        let err = CacheError::Fetch {
            key: "k".to_string(),
            cause: Arc::new(anyhow::anyhow!("boom")),
        };
        let cloned = err.clone();
        assert!(Arc::ptr_eq(
            err.fetch_cause().unwrap(),
            cloned.fetch_cause().unwrap()
        ));
    }

    #[test]
    fn test_memoize_error_call_passthrough() {
        let err: MemoizeError<std::num::ParseIntError> =
            MemoizeError::Call("x".parse::<i32>().unwrap_err());
        assert!(err.to_string().starts_with("Memoized call failed"));
        assert!(err.into_call_error().is_some());

        let err: MemoizeError<String> = CacheError::InvalidConfig("bad".into()).into();
        assert_eq!(err.to_string(), "Invalid configuration: bad");
        assert!(err.into_call_error().is_none());
    }
}
