//! Cache key derivation for memoized calls.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use xxhash_rust::xxh32::xxh32;

use crate::error::{CacheError, Result};

/// Caller-supplied mapping from call arguments to a cache key.
pub type KeyGenerator<A> = dyn Fn(&A) -> anyhow::Result<String> + Send + Sync;

/// How a memoized function turns its arguments into a key.
pub enum KeyStrategy<A> {
    /// Deterministic JSON serialization of the arguments
    Serialized,
    /// 32-bit xxHash digest of the serialized arguments, as 8 hex characters.
    /// Collisions become plausible past tens of thousands of distinct inputs.
    Hashed,
    Custom(Arc<KeyGenerator<A>>),
}

impl<A> Clone for KeyStrategy<A> {
    fn clone(&self) -> Self {
        match self {
            KeyStrategy::Serialized => KeyStrategy::Serialized,
            KeyStrategy::Hashed => KeyStrategy::Hashed,
            KeyStrategy::Custom(generator) => KeyStrategy::Custom(Arc::clone(generator)),
        }
    }
}

impl<A> fmt::Debug for KeyStrategy<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Serialized => f.write_str("Serialized"),
            KeyStrategy::Hashed => f.write_str("Hashed"),
            KeyStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<A: Serialize> KeyStrategy<A> {
    /// Derives the argument part of a cache key.
    ///
    /// # Errors
    /// `CacheError::KeyDerivation` when the arguments cannot be serialized or
    /// the custom generator fails.
    pub fn derive(&self, args: &A) -> Result<String> {
        match self {
            KeyStrategy::Serialized => serialize_args(args),
            KeyStrategy::Hashed => serialize_args(args).map(|json| hash_key(&json)),
            KeyStrategy::Custom(generator) => {
                generator(args).map_err(|e| CacheError::KeyDerivation(Arc::new(e)))
            }
        }
    }
}

/// Serializes call arguments to compact JSON.
///
/// Struct fields and tuples serialize in declaration order; types whose
/// iteration order is unspecified (such as `HashMap`) do not make stable keys.
pub fn serialize_args<A: Serialize + ?Sized>(args: &A) -> Result<String> {
    serde_json::to_string(args).map_err(|e| CacheError::KeyDerivation(Arc::new(e.into())))
}

/// Fixed-length digest of a serialized key.
pub fn hash_key(serialized: &str) -> String {
    format!("{:08x}", xxh32(serialized.as_bytes(), 0))
}
