//! Reactive Kernel
//!
//! This module implements the whole reactivity primitive: keyed cells, the
//! registry that owns their records, the notification bus, and the
//! change-tracking sugar on top.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A [`Cell`] is an identified, mutable reactive value slot. A plain cell
//! holds a constant seed; a derived cell holds a closure that recomputes the
//! value by reading other cells' current values.
//!
//! ## Registry
//!
//! The [`Registry`] is the authoritative key-to-record store. Reads always
//! re-derive through the current record, which is what keeps derived cells
//! fresh without any dependency graph: the closure plus the shared keyed
//! store is the entire mechanism.
//!
//! ## Bus
//!
//! The [`NotificationBus`] delivers `{previous_value, new_value}` events to
//! subscribers when a cell is written. One implicit topic exists per cell,
//! named `reactiveValue:<key>:change`.
//!
//! # The load-bearing asymmetry
//!
//! Recomputation propagates implicitly through reads (a pull model), while
//! notification propagates only through explicit writes to the written cell
//! itself. A derived cell stays correct automatically, but its subscribers
//! fire only when something writes to *that* cell, never when its inputs
//! change.

mod bus;
mod cell;
mod error;
mod registry;
mod runtime;
mod subscriber;
mod sync;
mod track;

pub use bus::{change_topic, Handler, NotificationBus, Payload};
pub use cell::{Cell, ChangeEvent};
pub use error::ReactiveError;
pub use registry::{BoxedValue, Recompute, Registry};
pub use runtime::{default_runtime, derived, reactive, Runtime};
pub use subscriber::SubscriberId;
pub use sync::{sync_with, BufferSurface, SyncOptions, SyncSurface};
pub use track::{on_change, stop_tracking, track_changes, TrackHandle};
