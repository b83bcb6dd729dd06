//! Memoize Module
//!
//! Wraps a function with a private cache keyed by its arguments.
//!
//! Keys are derived by serializing the arguments (default), hashing the
//! serialization (`hash_keys`), or a caller-supplied generator, then prefixed
//! with the function's name.

mod keys;
mod memoized;

pub use keys::{hash_key, serialize_args, KeyGenerator, KeyStrategy};
pub use memoized::{memoize, MemoizeOptions, Memoized};
