//! Reactive Runtime
//!
//! A `Runtime` is the explicitly constructed owner of one [`Registry`] and
//! one [`NotificationBus`]. Cells are created from a runtime and every read,
//! write, and notification of those cells routes through it; two handles
//! created from the same runtime with the same key observe the same record.
//!
//! Owning the pair explicitly keeps shared state visible: a program that
//! wants isolated reactive universes constructs one runtime per universe.
//! Programs that just want the convenience of free-function constructors use
//! the process-wide default runtime, which is created lazily on first use.
//!
//! # Execution model
//!
//! Everything is synchronous and runs in the caller's stack. A change
//! handler that writes a cell triggers a nested publish by direct recursion;
//! there are no locks held across user closures, so re-entrancy cannot
//! deadlock. Correctness under genuinely concurrent multi-threaded mutation
//! is not a design goal.

use std::sync::{Arc, OnceLock};

use super::bus::NotificationBus;
use super::cell::Cell;
use super::registry::Registry;

/// Owner of a registry/bus pair; the unit of reactive isolation.
///
/// `Runtime` is a cheap handle (`Clone` shares the same underlying pair).
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    registry: Registry,
    bus: NotificationBus,
}

impl Runtime {
    /// Create a runtime with an empty registry and bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                registry: Registry::new(),
                bus: NotificationBus::new(),
            }),
        }
    }

    /// Create a cell holding a constant seed value.
    pub fn cell<T>(&self, value: T) -> Cell<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        Cell::new_constant(self.clone(), value)
    }

    /// Create a derived cell whose value is recomputed by `f` on every read.
    ///
    /// `f` stays live by reading other cells through their handles; a
    /// closure that captures a copied primitive instead will never observe
    /// upstream writes.
    pub fn derived<T, F>(&self, f: F) -> Cell<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Cell::new_derived(self.clone(), f)
    }

    /// The runtime's registry.
    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The runtime's notification bus.
    pub(crate) fn bus(&self) -> &NotificationBus {
        &self.inner.bus
    }

    /// Drop every subscription on the runtime's bus.
    ///
    /// Full teardown only (test isolation); cell records are unaffected.
    pub fn clear_listeners(&self) {
        self.inner.bus.clear_listeners();
    }

    /// Number of cell records ever created in this runtime.
    pub fn cell_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether both runtimes share the same registry/bus pair.
    pub fn same_runtime(&self, other: &Runtime) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide default runtime, created lazily on first use.
///
/// This backs the free-function constructors [`reactive`] and [`derived`]
/// for programs that do not manage runtime instances themselves.
pub fn default_runtime() -> &'static Runtime {
    static DEFAULT: OnceLock<Runtime> = OnceLock::new();
    DEFAULT.get_or_init(Runtime::new)
}

/// Create a cell on the default runtime from a constant seed value.
pub fn reactive<T>(value: T) -> Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    default_runtime().cell(value)
}

/// Create a derived cell on the default runtime.
pub fn derived<T, F>(f: F) -> Cell<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    default_runtime().derived(f)
}
