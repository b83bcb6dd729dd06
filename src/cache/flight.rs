//! In-flight fetch registry.
//!
//! Backs the single-flight path of `Cache::get_or_set`: the first caller for
//! a key becomes the leader and runs the fetcher, later callers subscribe to
//! the leader's watch channel and receive the same outcome.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{CacheError, Result};

type Slot<V> = Option<Result<V>>;

/// Pending fetches keyed by cache key.
pub struct InFlight<V> {
    pending: Mutex<HashMap<String, watch::Receiver<Slot<V>>>>,
}

/// The role a caller plays in a fetch.
pub enum Flight<'a, V> {
    /// Run the fetcher and settle the ticket.
    Leader(LeaderTicket<'a, V>),
    /// Wait for the leader's outcome.
    Follower(watch::Receiver<Slot<V>>),
}

impl<V> Default for InFlight<V> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> fmt::Debug for InFlight<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("pending", &self.len())
            .finish()
    }
}

impl<V: Clone> InFlight<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the outstanding fetch for `key`, or registers a new one.
    pub fn join_or_lead(&self, key: &str) -> Flight<'_, V> {
        let mut pending = self.pending.lock();
        if let Some(receiver) = pending.get(key) {
            return Flight::Follower(receiver.clone());
        }

        let (sender, receiver) = watch::channel(None);
        pending.insert(key.to_string(), receiver);
        Flight::Leader(LeaderTicket {
            registry: self,
            key: key.to_string(),
            sender: Some(sender),
        })
    }

    /// Waits for a leader to publish its outcome.
    ///
    /// A leader dropped before settling yields `CacheError::FetchAbandoned`.
    pub async fn wait(mut receiver: watch::Receiver<Slot<V>>, key: &str) -> Result<V> {
        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| Err(CacheError::FetchAbandoned(key.to_string())))
    }
}

impl<V> InFlight<V> {
    /// Number of outstanding fetches.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Leader Ticket ==
/// Registration held by the leading caller.
///
/// Dropping the ticket without settling (the leader's future was dropped, or
/// the fetcher panicked) removes the registration and closes the channel.
pub struct LeaderTicket<'a, V> {
    registry: &'a InFlight<V>,
    key: String,
    sender: Option<watch::Sender<Slot<V>>>,
}

impl<V> LeaderTicket<'_, V> {
    /// Removes the registration, then publishes `outcome` to every follower.
    pub fn settle(mut self, outcome: Result<V>) {
        self.unregister();
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(outcome));
        }
    }

    fn unregister(&mut self) {
        if self.sender.is_some() {
            self.registry.pending.lock().remove(&self.key);
        }
    }
}

impl<V> Drop for LeaderTicket<'_, V> {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_caller_leads_second_follows() {
        let registry: InFlight<i32> = InFlight::new();

        let leader = registry.join_or_lead("k");
        assert!(matches!(leader, Flight::Leader(_)));
        assert_eq!(registry.len(), 1);

        let Flight::Follower(receiver) = registry.join_or_lead("k") else {
            panic!("second caller should follow");
        };

        let Flight::Leader(ticket) = leader else {
            unreachable!()
        };
        ticket.settle(Ok(5));

        assert!(registry.is_empty());
        assert_eq!(InFlight::wait(receiver, "k").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_settle_without_followers() {
        let registry: InFlight<i32> = InFlight::new();

        let Flight::Leader(ticket) = registry.join_or_lead("k") else {
            panic!("first caller should lead");
        };
        ticket.settle(Err(CacheError::FetchAbandoned("k".into())));

        assert!(registry.is_empty());
        assert!(matches!(registry.join_or_lead("k"), Flight::Leader(_)));
    }

    #[tokio::test]
    async fn test_dropped_leader_abandons_followers() {
        let registry: InFlight<i32> = InFlight::new();

        let leader = registry.join_or_lead("k");
        let Flight::Follower(receiver) = registry.join_or_lead("k") else {
            panic!("second caller should follow");
        };
        drop(leader);

        assert!(registry.is_empty());
        let result = InFlight::wait(receiver, "k").await;
        assert!(matches!(result, Err(CacheError::FetchAbandoned(key)) if key == "k"));
    }

    #[test]
    fn test_keys_are_independent() {
        let registry: InFlight<i32> = InFlight::new();

        let _a = registry.join_or_lead("a");
        assert!(matches!(registry.join_or_lead("b"), Flight::Leader(_)));
        assert_eq!(registry.len(), 1);
    }
}
