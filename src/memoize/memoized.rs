//! Memoized function wrapper.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::{Cache, CacheHooks, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{MemoizeError, Result};
use crate::memoize::{KeyGenerator, KeyStrategy};

// == Memoize Options ==
/// Engine settings plus the key derivation strategy for a memoized function.
///
/// A custom key generator takes precedence over `hash_keys`.
pub struct MemoizeOptions<A, T> {
    pub config: CacheConfig,
    pub hooks: CacheHooks<T>,
    pub hash_keys: bool,
    pub key_generator: Option<Arc<KeyGenerator<A>>>,
    pub clock: Arc<dyn Clock>,
}

impl<A, T> Default for MemoizeOptions<A, T> {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            hooks: CacheHooks::new(),
            hash_keys: false,
            key_generator: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl<A, T> MemoizeOptions<A, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, hooks: CacheHooks<T>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hash_keys(mut self, enabled: bool) -> Self {
        self.hash_keys = enabled;
        self
    }

    pub fn key_generator(
        mut self,
        generator: impl Fn(&A) -> anyhow::Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.key_generator = Some(Arc::new(generator));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn key_strategy(&self) -> KeyStrategy<A> {
        match (&self.key_generator, self.hash_keys) {
            (Some(generator), _) => KeyStrategy::Custom(Arc::clone(generator)),
            (None, true) => KeyStrategy::Hashed,
            (None, false) => KeyStrategy::Serialized,
        }
    }
}

struct Inner<A, T, F> {
    name: String,
    func: F,
    strategy: KeyStrategy<A>,
    cache: Cache<T>,
}

// == Memoized ==
/// A function paired with a private cache of its results.
///
/// Each `Memoized` owns one [`Cache`]; clones share it. Cache keys are
/// `"{name}:{derived}"`, so distinct names never collide.
///
/// ```
/// use std::convert::Infallible;
/// use memo_cache::{Memoized, MemoizeOptions};
///
/// let square = Memoized::new("square", |n: &u64| Ok::<_, Infallible>(n * n), MemoizeOptions::new());
///
/// assert_eq!(square.call(&12).unwrap(), 144);
/// assert_eq!(square.call(&12).unwrap(), 144);
/// assert_eq!(square.cache().stats().hits, 1);
/// ```
pub struct Memoized<A, T, F> {
    inner: Arc<Inner<A, T, F>>,
}

impl<A, T, F> Clone for Memoized<A, T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T, F> fmt::Debug for Memoized<A, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.inner.name)
            .field("strategy", &self.inner.strategy)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl<A: Serialize, T: Clone, F> Memoized<A, T, F> {
    /// Wraps a fallible synchronous function.
    pub fn new<E>(name: impl Into<String>, func: F, options: MemoizeOptions<A, T>) -> Self
    where
        F: Fn(&A) -> std::result::Result<T, E>,
    {
        Self::build(name.into(), func, options)
    }

    /// Wraps a fallible asynchronous function.
    ///
    /// The returned future may not borrow the arguments; copy what it needs
    /// before the `async move` block.
    pub fn new_async<E, Fut>(name: impl Into<String>, func: F, options: MemoizeOptions<A, T>) -> Self
    where
        F: Fn(&A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        Self::build(name.into(), func, options)
    }

    fn build(name: String, func: F, options: MemoizeOptions<A, T>) -> Self {
        let strategy = options.key_strategy();
        let cache = Cache::with_clock(options.config, options.hooks, options.clock);
        Self {
            inner: Arc::new(Inner {
                name,
                func,
                strategy,
                cache,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The private cache backing this function.
    pub fn cache(&self) -> &Cache<T> {
        &self.inner.cache
    }

    /// The full cache key for `args`.
    ///
    /// # Errors
    /// `CacheError::KeyDerivation` if no key can be derived.
    pub fn key_for(&self, args: &A) -> Result<String> {
        let derived = self.inner.strategy.derive(args)?;
        Ok(format!("{}:{}", self.inner.name, derived))
    }

    fn cached(&self, key: &str) -> Option<T> {
        if self.inner.cache.has(key) {
            self.inner.cache.get(key)
        } else {
            None
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, or calls the function and caches
    /// its result.
    ///
    /// # Errors
    /// `MemoizeError::Cache` if the key cannot be derived (the function is
    /// not called), or `MemoizeError::Call` with the function's own error
    /// (nothing is cached).
    pub fn call<E>(&self, args: &A) -> std::result::Result<T, MemoizeError<E>>
    where
        F: Fn(&A) -> std::result::Result<T, E>,
    {
        let key = self.key_for(args)?;
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        debug!("Memoized {} computing {:?}", self.inner.name, key);
        let value = (self.inner.func)(args).map_err(MemoizeError::Call)?;
        self.inner.cache.set(key, value.clone());
        Ok(value)
    }

    /// Async counterpart of [`Memoized::call`].
    ///
    /// Only settled successes are cached; a failed future leaves the key
    /// absent so the next call retries.
    pub async fn call_async<E, Fut>(&self, args: &A) -> std::result::Result<T, MemoizeError<E>>
    where
        F: Fn(&A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key_for(args)?;
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        debug!("Memoized {} awaiting {:?}", self.inner.name, key);
        let value = (self.inner.func)(args).await.map_err(MemoizeError::Call)?;
        self.inner.cache.set(key, value.clone());
        Ok(value)
    }
}

/// Wraps a fallible synchronous function with default options.
pub fn memoize<A, T, E, F>(name: impl Into<String>, func: F) -> Memoized<A, T, F>
where
    A: Serialize,
    T: Clone,
    F: Fn(&A) -> std::result::Result<T, E>,
{
    Memoized::new(name, func, MemoizeOptions::default())
}
