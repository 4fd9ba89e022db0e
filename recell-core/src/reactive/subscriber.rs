//! Subscriber identity for the notification bus.
//!
//! Topic membership on the bus is identity-based: a handler is "the same
//! subscription" when it carries the same `SubscriberId`. Closures in Rust
//! have no usable identity of their own, so every subscription is keyed by
//! an explicit ID minted here.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a bus subscription.
///
/// Each subscription (change tracker, sync adapter, or direct bus client)
/// gets a unique ID when created. The ID is what makes unsubscription and
/// duplicate-subscription detection possible without retaining a reference
/// to the original callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}
