//! Keyed Cell Registry
//!
//! The registry is the sole authority for "what is the current value under
//! key K". It maps monotonically assigned integer keys to cell records and
//! nothing else; notification is the bus's job and typing is the handle's
//! job.
//!
//! # Records
//!
//! A record is the triple `{ key, recompute, value }`. `recompute` is a
//! zero-argument closure producing the current value: a constant-returning
//! closure for plain seeds and written values, the user's expression for
//! derived cells. `value` is cached once at create/write time for
//! bookkeeping; live reads always call `recompute` and never trust the
//! cache. Exactly one record exists per key, a write replaces the record
//! wholesale, and there is no deletion: records persist for the registry's
//! lifetime.
//!
//! # Locking
//!
//! The record map sits behind an `RwLock`, but the lock is never held while
//! a recompute closure runs. `read` clones the `Arc`'d closure out under the
//! lock and invokes it afterwards, so a derived closure that reads other
//! cells re-enters the registry freely.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use super::error::ReactiveError;

/// A type-erased cell value.
///
/// The registry is heterogeneous (any value type per key) while handles are
/// typed, so records store `dyn Any` and the typed handle downcasts on read.
pub type BoxedValue = Arc<dyn Any + Send + Sync>;

/// A zero-argument closure producing a cell's current value.
pub type Recompute = Arc<dyn Fn() -> BoxedValue + Send + Sync>;

/// The unit of truth for one cell, owned exclusively by the registry.
struct CellRecord {
    key: u64,
    recompute: Recompute,
    /// Last value produced at create/write time. Freshness comes from
    /// `recompute`; this cache is never consulted after it is written.
    value: BoxedValue,
}

/// Authoritative key-to-record store.
///
/// Keys start at 0 and increment by 1, are never reused, and records are
/// never deleted. Bounded growth over the registry's lifetime is an accepted
/// limitation of the design, not a goal.
pub struct Registry {
    records: RwLock<HashMap<u64, CellRecord>>,
    next_key: AtomicU64,
}

impl Registry {
    /// Create an empty registry. Key assignment starts at 0.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_key: AtomicU64::new(0),
        }
    }

    /// Assign the next key, seed a record with `recompute()`, and return the
    /// key.
    ///
    /// `recompute` is invoked exactly once here, for the bookkeeping cache
    /// only; live reads re-derive instead of reading the seed.
    pub fn create(&self, recompute: Recompute) -> u64 {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);

        // Seed outside the lock: the closure may read other cells.
        let value = recompute();

        trace!(key, "registry create");

        self.records
            .write()
            .expect("records lock poisoned")
            .insert(key, CellRecord { key, recompute, value });

        key
    }

    /// Replace the record at `key` with a constant recompute of `raw_value`.
    ///
    /// Writing a key that has no record is a programmer error and fails
    /// fast with [`ReactiveError::UnknownKey`].
    pub fn write(&self, key: u64, raw_value: BoxedValue) -> Result<(), ReactiveError> {
        let mut records = self.records.write().expect("records lock poisoned");
        let record = records.get_mut(&key).ok_or(ReactiveError::UnknownKey(key))?;

        trace!(key = record.key, "registry write");

        let constant = Arc::clone(&raw_value);
        record.recompute = Arc::new(move || Arc::clone(&constant));
        record.value = raw_value;

        Ok(())
    }

    /// Return `recompute()` of the record at `key`, or `fallback()` when no
    /// record exists.
    ///
    /// The fallback branch should be unreachable under normal use, since
    /// `create` always precedes `read`; it exists so a handle degrades to
    /// its own original derivation instead of failing.
    pub fn read(&self, key: u64, fallback: &Recompute) -> BoxedValue {
        let recompute = {
            let records = self.records.read().expect("records lock poisoned");
            records.get(&key).map(|record| Arc::clone(&record.recompute))
        };

        // Lock released: the closure may re-enter the registry.
        match recompute {
            Some(recompute) => recompute(),
            None => fallback(),
        }
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: u64) -> bool {
        self.records
            .read()
            .expect("records lock poisoned")
            .contains_key(&key)
    }

    /// Number of records ever created (records are never deleted).
    pub fn len(&self) -> usize {
        self.records.read().expect("records lock poisoned").len()
    }

    /// Whether the registry has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cached (seed-time) value of a record, for inspection in tests.
    #[cfg(test)]
    fn cached_value(&self, key: u64) -> Option<BoxedValue> {
        self.records
            .read()
            .expect("records lock poisoned")
            .get(&key)
            .map(|record| Arc::clone(&record.value))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
