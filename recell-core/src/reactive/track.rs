//! Change Tracking
//!
//! Subscribe/unsubscribe sugar over the notification bus, keyed by a cell's
//! change topic. None of these functions validate that the cell's topic has
//! ever been published: subscribing to a topic that never fires is legal and
//! simply never delivers.
//!
//! Subscriptions live until explicitly stopped. Dropping a [`TrackHandle`]
//! without calling [`TrackHandle::stop`] leaves the subscription registered;
//! there is no implicit unsubscribe-on-drop.

use std::sync::Arc;

use super::bus::{change_topic, Handler, Payload};
use super::cell::{Cell, ChangeEvent};
use super::runtime::Runtime;
use super::subscriber::SubscriberId;

/// Capability to stop one tracking subscription.
///
/// Returned by [`track_changes`] so the caller need not retain the original
/// callback (or even its [`SubscriberId`]) to unsubscribe later.
pub struct TrackHandle {
    runtime: Runtime,
    topic: String,
    id: SubscriberId,
}

impl TrackHandle {
    /// Unsubscribe the tracked callback. Idempotent at the bus level:
    /// stopping a subscription that is already gone is a silent no-op.
    pub fn stop(self) {
        self.runtime.bus().unsubscribe(&self.topic, self.id);
    }

    /// The identity of this subscription, usable with [`stop_tracking`].
    pub fn subscriber_id(&self) -> SubscriberId {
        self.id
    }
}

/// Subscribe `callback` to `cell`'s change topic and return a stop handle.
///
/// The callback receives every [`ChangeEvent`] published by writes to this
/// cell, synchronously, in the writer's call stack.
pub fn track_changes<T, F>(cell: &Cell<T>, callback: F) -> TrackHandle
where
    T: Clone + Send + Sync + 'static,
    F: Fn(ChangeEvent<T>) + Send + Sync + 'static,
{
    let id = SubscriberId::new();
    let topic = change_topic(cell.key());

    let handler: Handler = Arc::new(move |payload: &Payload| {
        if let Some(event) = payload.downcast_ref::<ChangeEvent<T>>() {
            callback(event.clone());
        }
    });

    cell.runtime().bus().subscribe(&topic, id, handler);

    TrackHandle {
        runtime: cell.runtime().clone(),
        topic,
        id,
    }
}

/// Fire-and-forget variant of [`track_changes`]: same subscription, no stop
/// handle. The callback stays subscribed for the runtime's lifetime unless
/// the bus is torn down wholesale.
pub fn on_change<T, F>(cell: &Cell<T>, callback: F)
where
    T: Clone + Send + Sync + 'static,
    F: Fn(ChangeEvent<T>) + Send + Sync + 'static,
{
    let _ = track_changes(cell, callback);
}

/// Free-function unsubscribe by subscription identity.
///
/// With `Some(id)`, removes that subscription from the cell's change topic.
/// With `None` the call is a documented no-op placeholder: membership is
/// identity-based, so without an identity nothing can match.
pub fn stop_tracking<T>(cell: &Cell<T>, id: Option<SubscriberId>)
where
    T: Clone + Send + Sync + 'static,
{
    let Some(id) = id else {
        return;
    };
    cell.runtime().bus().unsubscribe(&change_topic(cell.key()), id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    #[test]
    fn write_publishes_exactly_one_event_with_previous_and_new() {
        let runtime = Runtime::new();
        let cell = runtime.cell(1);

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_inner = events.clone();
        let _handle = track_changes(&cell, move |event| {
            events_inner.lock().unwrap().push(event);
        });

        cell.set(2);

        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            ChangeEvent {
                previous_value: 1,
                new_value: 2
            }
        );
    }

    #[test]
    fn previous_value_is_the_recomputed_pre_write_value() {
        let runtime = Runtime::new();
        let a = runtime.cell(3);

        let a_handle = a.clone();
        let doubled = runtime.derived(move || a_handle.get() * 2);

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_inner = events.clone();
        let _handle = track_changes(&doubled, move |event| {
            events_inner.lock().unwrap().push(event);
        });

        // Writing the derived cell reports its current derivation (6), not
        // its creation-time cache, as the previous value.
        doubled.set(100);

        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].previous_value, 6);
        assert_eq!(seen[0].new_value, 100);
    }

    #[test]
    fn handle_stop_ends_delivery() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);

        let count = Arc::new(AtomicI32::new(0));
        let count_inner = count.clone();
        let handle = track_changes(&cell, move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        handle.stop();
        cell.set(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_tracking_is_idempotent_and_tolerates_strangers() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);

        let count = Arc::new(AtomicI32::new(0));
        let count_inner = count.clone();
        let handle = track_changes(&cell, move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });
        let id = handle.subscriber_id();

        // An identity never subscribed, and the no-identity placeholder:
        // both silent no-ops that leave the real subscription alive.
        stop_tracking(&cell, Some(SubscriberId::new()));
        stop_tracking(&cell, None);

        cell.set(1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Stopping twice by identity is also a no-op the second time.
        stop_tracking(&cell, Some(id));
        stop_tracking(&cell, Some(id));

        cell.set(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn on_change_subscribes_without_a_handle() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);

        let count = Arc::new(AtomicI32::new(0));
        let count_inner = count.clone();
        on_change(&cell, move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        cell.set(2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn derived_inputs_do_not_notify_the_derived_cell() {
        let runtime = Runtime::new();
        let a = runtime.cell(1);

        let a_handle = a.clone();
        let b = runtime.derived(move || a_handle.get() + 1);

        let count = Arc::new(AtomicI32::new(0));
        let count_inner = count.clone();
        let _handle = track_changes(&b, move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });

        // Recomputation propagates through reads, notification does not:
        // writing `a` changes `b.get()` but fires no event on `b`'s topic.
        a.set(10);
        assert_eq!(b.get(), 11);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_reading_the_written_cell_sees_the_pre_write_value() {
        let runtime = Runtime::new();
        let cell = runtime.cell(1);

        let observed = Arc::new(AtomicI32::new(-1));
        let observed_inner = observed.clone();
        let cell_inner = cell.clone();
        let _handle = track_changes(&cell, move |_| {
            // Publish happens before the record is replaced.
            observed_inner.store(cell_inner.get(), Ordering::SeqCst);
        });

        cell.set(2);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn stop_from_inside_the_callback() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);

        let count = Arc::new(AtomicI32::new(0));
        let slot: Arc<Mutex<Option<TrackHandle>>> = Arc::new(Mutex::new(None));

        let count_inner = count.clone();
        let slot_inner = slot.clone();
        let handle = track_changes(&cell, move |event| {
            if event.new_value > 5 {
                if let Some(handle) = slot_inner.lock().unwrap().take() {
                    handle.stop();
                }
            } else {
                count_inner.fetch_add(1, Ordering::SeqCst);
            }
        });
        *slot.lock().unwrap() = Some(handle);

        for value in 2..=10 {
            cell.set(value);
        }

        // Values 2..=5 count; 6 takes the stop branch; 7..=10 never deliver.
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }
}
