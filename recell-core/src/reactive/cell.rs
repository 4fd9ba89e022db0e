//! Cell Handle
//!
//! A `Cell<T>` is the thin, typed accessor a program holds for one keyed
//! record. The handle never stores the authoritative value itself: `get`
//! routes through the runtime's registry and returns a fresh recomputation,
//! and `set` runs the write protocol (previous-value capture, publish,
//! record replacement).
//!
//! # The pull/push asymmetry
//!
//! Recomputation propagates implicitly through reads: a derived cell whose
//! closure reads `a.get()` observes every write to `a` without subscribing
//! to anything. Notification propagates only through explicit writes to the
//! written cell itself: a derived cell's own subscribers never fire when an
//! input changes, only when something writes to *that* derived cell.
//!
//! # Write ordering
//!
//! `set` publishes its change event *before* replacing the registry record.
//! Subscribers therefore receive `previous_value` as the last-seen value,
//! and a handler that reads the written cell during delivery still observes
//! the pre-write value. Record replacement is the last step, which means a
//! handler that panics mid-publish aborts the write before the replacement
//! lands.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use super::bus::change_topic;
use super::registry::{BoxedValue, Recompute};
use super::runtime::Runtime;

/// The payload delivered to change subscribers on every write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent<T> {
    /// The registry's recomputed value immediately before the write landed.
    pub previous_value: T,
    /// The value being assigned.
    pub new_value: T,
}

/// A typed handle to one keyed cell record.
///
/// Cloning a handle shares the key and runtime; any two handles with the
/// same key observe the same record. Handles are never destroyed in the
/// registry sense: dropping every handle leaves the record in place.
pub struct Cell<T> {
    key: u64,
    runtime: Runtime,
    /// The original recompute closure, kept as the defensive fallback for
    /// the (normally unreachable) case of a read finding no record.
    origin: Recompute,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Install a constant-seed record and return its handle.
    pub(crate) fn new_constant(runtime: Runtime, value: T) -> Self {
        let recompute: Recompute = Arc::new(move || Arc::new(value.clone()) as BoxedValue);
        Self::install(runtime, recompute)
    }

    /// Install a derived record and return its handle.
    pub(crate) fn new_derived<F>(runtime: Runtime, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let recompute: Recompute = Arc::new(move || Arc::new(f()) as BoxedValue);
        Self::install(runtime, recompute)
    }

    fn install(runtime: Runtime, recompute: Recompute) -> Self {
        let key = runtime.registry().create(Arc::clone(&recompute));
        Self {
            key,
            runtime,
            origin: recompute,
            _marker: PhantomData,
        }
    }

    /// The cell's immutable key. Never re-derived.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Read the current value.
    ///
    /// Always a fresh recomputation through the registry's current record,
    /// never the handle's captured snapshot. A derivation closure that
    /// panics propagates to this caller.
    pub fn get(&self) -> T {
        let value = self.runtime.registry().read(self.key, &self.origin);
        value
            .downcast_ref::<T>()
            .expect("cell record value type mismatch")
            .clone()
    }

    /// Write a new value.
    ///
    /// Publishes `ChangeEvent { previous_value, new_value }` on the cell's
    /// change topic, then replaces the registry record with a constant
    /// recompute of `value`. Subsequent reads return `value` verbatim until
    /// the next write. The assignment itself has no validation hook and
    /// always succeeds for a live handle.
    pub fn set(&self, value: T) {
        // Capture the last-seen value before the record is replaced.
        let previous_value = self.get();

        trace!(key = self.key, "cell write");

        let event = ChangeEvent {
            previous_value,
            new_value: value.clone(),
        };
        self.runtime
            .bus()
            .publish(&change_topic(self.key), Arc::new(event));

        self.runtime
            .registry()
            .write(self.key, Arc::new(value) as BoxedValue)
            .expect("live cell handle must have a registry record");
    }

    /// Write a new value computed from the current one.
    ///
    /// Reads through the registry, applies `f`, and runs the full write
    /// protocol on the result (one notification is published).
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next);
    }

    /// The runtime this cell was created from.
    pub(crate) fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            runtime: self.runtime.clone(),
            origin: Arc::clone(&self.origin),
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for Cell<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("key", &self.key)
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_cell_get_and_set() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);

        assert_eq!(cell.get(), 0);

        cell.set(42);
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn derived_cell_observes_upstream_writes() {
        let runtime = Runtime::new();
        let a = runtime.cell(2);

        let a_handle = a.clone();
        let b = runtime.derived(move || a_handle.get() * 2);

        assert_eq!(b.get(), 4);

        a.set(4);
        assert_eq!(b.get(), 8);
    }

    #[test]
    fn derived_over_copied_primitive_stays_stale() {
        let runtime = Runtime::new();
        let a = runtime.cell(2);

        // Copying the primitive out severs the live read.
        let copied = a.get();
        let stale = runtime.derived(move || copied * 2);

        a.set(100);
        assert_eq!(stale.get(), 4);
    }

    #[test]
    fn write_freezes_a_derived_cell() {
        let runtime = Runtime::new();
        let a = runtime.cell(1);

        let a_handle = a.clone();
        let b = runtime.derived(move || a_handle.get() + 10);
        assert_eq!(b.get(), 11);

        // Writing replaces the derivation with a constant.
        b.set(0);
        a.set(50);
        assert_eq!(b.get(), 0);
    }

    #[test]
    fn update_goes_through_the_write_protocol() {
        let runtime = Runtime::new();
        let cell = runtime.cell(10);

        cell.update(|v| v + 5);
        assert_eq!(cell.get(), 15);
    }

    #[test]
    fn keys_are_distinct_and_strictly_increasing() {
        let runtime = Runtime::new();
        let cells: Vec<_> = (0..6).map(|n| runtime.cell(n)).collect();

        for pair in cells.windows(2) {
            assert!(pair[0].key() < pair[1].key());
        }
    }

    #[test]
    fn key_is_immutable_across_writes() {
        let runtime = Runtime::new();
        let cell = runtime.cell(String::from("a"));
        let key = cell.key();

        cell.set(String::from("b"));
        cell.set(String::from("c"));
        assert_eq!(cell.key(), key);
    }

    #[test]
    fn clone_shares_the_record() {
        let runtime = Runtime::new();
        let cell = runtime.cell(0);
        let clone = cell.clone();

        cell.set(42);
        assert_eq!(clone.get(), 42);

        clone.set(100);
        assert_eq!(cell.get(), 100);
        assert_eq!(cell.key(), clone.key());
    }

    #[test]
    fn mutating_a_returned_composite_does_not_change_the_cell() {
        let runtime = Runtime::new();
        let cell = runtime.cell(vec![1, 2, 3]);

        // get() hands out a clone; in-place mutation of it is invisible.
        let mut copy = cell.get();
        copy.push(4);
        assert_eq!(cell.get(), vec![1, 2, 3]);

        // Assignment is the only mutation path.
        cell.set(copy);
        assert_eq!(cell.get(), vec![1, 2, 3, 4]);
    }
}
