//! Lifecycle Hooks Module
//!
//! Optional callbacks fired on hits, misses, writes, evictions, expirations
//! and deletions. A panicking hook is contained and logged; it never reaches
//! the caller or disturbs cache state.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

// == Event Reasons ==
/// Why a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    NotFound,
    Expired,
}

/// Which operation discovered an expired entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpireSource {
    Get,
    Has,
    Prune,
}

/// Which operation removed an entry on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteSource {
    Delete,
    Clear,
    DeleteByPrefix,
    DeleteByMagicString,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NotFound => "not_found",
            MissReason::Expired => "expired",
        }
    }
}

impl ExpireSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpireSource::Get => "get",
            ExpireSource::Has => "has",
            ExpireSource::Prune => "prune",
        }
    }
}

impl DeleteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteSource::Delete => "delete",
            DeleteSource::Clear => "clear",
            DeleteSource::DeleteByPrefix => "deleteByPrefix",
            DeleteSource::DeleteByMagicString => "deleteByMagicString",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(MissReason, ExpireSource, DeleteSource);

// == Cache Event ==
/// A lifecycle event recorded by the store, dispatched once the store lock
/// has been released.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent<V> {
    Hit {
        key: String,
        value: V,
    },
    Miss {
        key: String,
        reason: MissReason,
    },
    Set {
        key: String,
        value: V,
        is_update: bool,
    },
    Evict {
        key: String,
        value: V,
    },
    Expire {
        key: String,
        value: V,
        source: ExpireSource,
    },
    Delete {
        key: String,
        value: V,
        source: DeleteSource,
    },
}

impl<V> CacheEvent<V> {
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Hit { key, .. }
            | CacheEvent::Miss { key, .. }
            | CacheEvent::Set { key, .. }
            | CacheEvent::Evict { key, .. }
            | CacheEvent::Expire { key, .. }
            | CacheEvent::Delete { key, .. } => key,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "onHit",
            CacheEvent::Miss { .. } => "onMiss",
            CacheEvent::Set { .. } => "onSet",
            CacheEvent::Evict { .. } => "onEvict",
            CacheEvent::Expire { .. } => "onExpire",
            CacheEvent::Delete { .. } => "onDelete",
        }
    }
}

type ValueHook<V> = Box<dyn Fn(&str, &V) + Send + Sync>;
type MissHook = Box<dyn Fn(&str, MissReason) + Send + Sync>;
type SetHook<V> = Box<dyn Fn(&str, &V, bool) + Send + Sync>;
type ExpireHook<V> = Box<dyn Fn(&str, &V, ExpireSource) + Send + Sync>;
type DeleteHook<V> = Box<dyn Fn(&str, &V, DeleteSource) + Send + Sync>;

// == Cache Hooks ==
/// The six optional lifecycle callbacks.
///
/// ```
/// use memo_cache::CacheHooks;
///
/// let hooks = CacheHooks::<u32>::new()
///     .on_hit(|key, value| println!("hit {key} = {value}"))
///     .on_miss(|key, reason| println!("miss {key} ({reason})"));
/// assert!(!hooks.is_empty());
/// ```
pub struct CacheHooks<V> {
    on_hit: Option<ValueHook<V>>,
    on_miss: Option<MissHook>,
    on_set: Option<SetHook<V>>,
    on_evict: Option<ValueHook<V>>,
    on_expire: Option<ExpireHook<V>>,
    on_delete: Option<DeleteHook<V>>,
}

impl<V> Default for CacheHooks<V> {
    fn default() -> Self {
        Self {
            on_hit: None,
            on_miss: None,
            on_set: None,
            on_evict: None,
            on_expire: None,
            on_delete: None,
        }
    }
}

impl<V> fmt::Debug for CacheHooks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHooks")
            .field("on_hit", &self.on_hit.is_some())
            .field("on_miss", &self.on_miss.is_some())
            .field("on_set", &self.on_set.is_some())
            .field("on_evict", &self.on_evict.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .finish()
    }
}

impl<V> CacheHooks<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_hit(mut self, hook: impl Fn(&str, &V) + Send + Sync + 'static) -> Self {
        self.on_hit = Some(Box::new(hook));
        self
    }

    pub fn on_miss(mut self, hook: impl Fn(&str, MissReason) + Send + Sync + 'static) -> Self {
        self.on_miss = Some(Box::new(hook));
        self
    }

    /// The flag passed to the hook is true when the key already existed.
    pub fn on_set(mut self, hook: impl Fn(&str, &V, bool) + Send + Sync + 'static) -> Self {
        self.on_set = Some(Box::new(hook));
        self
    }

    pub fn on_evict(mut self, hook: impl Fn(&str, &V) + Send + Sync + 'static) -> Self {
        self.on_evict = Some(Box::new(hook));
        self
    }

    pub fn on_expire(
        mut self,
        hook: impl Fn(&str, &V, ExpireSource) + Send + Sync + 'static,
    ) -> Self {
        self.on_expire = Some(Box::new(hook));
        self
    }

    pub fn on_delete(
        mut self,
        hook: impl Fn(&str, &V, DeleteSource) + Send + Sync + 'static,
    ) -> Self {
        self.on_delete = Some(Box::new(hook));
        self
    }

    /// True when no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.on_hit.is_none()
            && self.on_miss.is_none()
            && self.on_set.is_none()
            && self.on_evict.is_none()
            && self.on_expire.is_none()
            && self.on_delete.is_none()
    }

    // == Dispatch ==
    /// Runs the hook matching `event`, swallowing any panic it raises.
    pub fn dispatch(&self, event: &CacheEvent<V>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event {
            CacheEvent::Hit { key, value } => {
                if let Some(hook) = &self.on_hit {
                    hook(key, value);
                }
            }
            CacheEvent::Miss { key, reason } => {
                if let Some(hook) = &self.on_miss {
                    hook(key, *reason);
                }
            }
            CacheEvent::Set {
                key,
                value,
                is_update,
            } => {
                if let Some(hook) = &self.on_set {
                    hook(key, value, *is_update);
                }
            }
            CacheEvent::Evict { key, value } => {
                if let Some(hook) = &self.on_evict {
                    hook(key, value);
                }
            }
            CacheEvent::Expire { key, value, source } => {
                if let Some(hook) = &self.on_expire {
                    hook(key, value, *source);
                }
            }
            CacheEvent::Delete { key, value, source } => {
                if let Some(hook) = &self.on_delete {
                    hook(key, value, *source);
                }
            }
        }));

        if outcome.is_err() {
            warn!("{} hook panicked for key {:?}; ignoring", event.name(), event.key());
        }
    }

    /// Dispatches a batch in order.
    pub fn dispatch_all(&self, events: &[CacheEvent<V>]) {
        for event in events {
            self.dispatch(event);
        }
    }
}
