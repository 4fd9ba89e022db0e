//! Recell Core
//!
//! A minimal fine-grained reactivity primitive: mutable value cells with
//! process-unique keys, a change-notification bus, and derived cells that
//! recompute by closing over other cells' current values. It lets a program
//! declare dependent values without a reactive UI framework, and lets
//! observers subscribe to a cell's changes.
//!
//! There is deliberately no dependency graph, no batching or topological
//! scheduling, and no memoization. Derived cells stay fresh purely because
//! every read re-derives through a shared keyed store; change notifications
//! exist only for explicit writes.
//!
//! # Example
//!
//! ```rust
//! use recell_core::reactive::{Runtime, track_changes};
//!
//! let runtime = Runtime::new();
//!
//! // A plain cell and a cell derived from it.
//! let count = runtime.cell(2);
//! let count_handle = count.clone();
//! let doubled = runtime.derived(move || count_handle.get() * 2);
//!
//! assert_eq!(doubled.get(), 4);
//!
//! // Observers hear about explicit writes.
//! let _track = track_changes(&count, |event| {
//!     println!("{} -> {}", event.previous_value, event.new_value);
//! });
//!
//! count.set(10);
//! assert_eq!(doubled.get(), 20);
//! ```

pub mod reactive;
