//! Notification Bus
//!
//! A named-topic publish/subscribe mechanism that decouples writers of a
//! cell from readers interested in its changes. There is no persistence and
//! no delivery guarantee beyond "every currently subscribed handler runs
//! synchronously, in registration order, in the publisher's call stack".
//!
//! # Topics
//!
//! Every cell gets one implicit channel named `reactiveValue:<key>:change`.
//! Nothing restricts the bus to that namespace, but the kernel never
//! publishes under any other topic and no wildcard subscription exists.
//!
//! # Re-entrancy
//!
//! `publish` iterates over a snapshot of the topic's subscriber list taken
//! before the first handler runs. A handler may therefore subscribe or
//! unsubscribe (including itself) mid-publish without invalidating the
//! iteration; the in-flight delivery still sees the old list. The snapshot
//! is taken with the topic lock released before any handler is invoked, so
//! a handler that writes a cell (and thereby publishes again) recurses
//! directly instead of deadlocking.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

use super::subscriber::SubscriberId;

/// A type-erased notification payload.
///
/// The kernel publishes [`ChangeEvent`](crate::reactive::ChangeEvent) values;
/// handlers downcast to the event type they expect and ignore anything else.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A subscriber callback, invoked with the published payload.
pub type Handler = Arc<dyn Fn(&Payload) + Send + Sync>;

/// The change topic for a cell key: `reactiveValue:<key>:change`.
pub fn change_topic(key: u64) -> String {
    format!("reactiveValue:{key}:change")
}

/// Named-topic publish/subscribe bus.
///
/// Subscriptions are keyed by [`SubscriberId`]; re-subscribing an ID that is
/// already a member of a topic is idempotent. Handlers run synchronously and
/// a panicking handler propagates to the publisher, aborting the remaining
/// deliveries of that publish.
pub struct NotificationBus {
    /// Per-topic subscriber lists, in registration order.
    topics: RwLock<HashMap<String, Vec<(SubscriberId, Handler)>>>,
}

impl NotificationBus {
    /// Create a bus with no topics.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handler` under `topic` with the given subscriber identity.
    ///
    /// If `id` is already subscribed to `topic`, the call is a no-op and the
    /// original handler stays registered in its original position.
    pub fn subscribe(&self, topic: &str, id: SubscriberId, handler: Handler) -> &Self {
        let mut topics = self.topics.write().expect("topics lock poisoned");
        let entries = topics.entry(topic.to_string()).or_default();

        if entries.iter().all(|(existing, _)| *existing != id) {
            trace!(topic, ?id, "bus subscribe");
            entries.push((id, handler));
        }

        self
    }

    /// Remove the subscription `id` from `topic`.
    ///
    /// Silently does nothing when the topic has no subscribers or the id was
    /// never subscribed; unsubscription is always safe to repeat.
    pub fn unsubscribe(&self, topic: &str, id: SubscriberId) -> &Self {
        let mut topics = self.topics.write().expect("topics lock poisoned");

        if let Some(entries) = topics.get_mut(topic) {
            entries.retain(|(existing, _)| *existing != id);
        }

        self
    }

    /// Invoke every handler currently registered under `topic`, in
    /// registration order, passing `payload` to each.
    ///
    /// Publishing to an unknown or empty topic is a no-op.
    pub fn publish(&self, topic: &str, payload: Payload) {
        let snapshot: Vec<Handler> = {
            let topics = self.topics.read().expect("topics lock poisoned");
            match topics.get(topic) {
                Some(entries) if !entries.is_empty() => {
                    entries.iter().map(|(_, handler)| Arc::clone(handler)).collect()
                }
                _ => return,
            }
        };

        trace!(topic, subscribers = snapshot.len(), "bus publish");

        // Lock released above: handlers are free to re-enter the bus.
        for handler in snapshot {
            handler(&payload);
        }
    }

    /// Drop every topic and every subscription.
    ///
    /// Full-teardown only (test isolation); not part of steady-state use.
    pub fn clear_listeners(&self) {
        self.topics.write().expect("topics lock poisoned").clear();
    }

    /// Number of subscriptions currently registered under `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .expect("topics lock poisoned")
            .get(topic)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
