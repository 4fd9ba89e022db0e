//! External Sync Adapter
//!
//! Mirrors a cell's value onto an external surface (a DOM element, a
//! terminal region, a plain buffer) on every effective change. The adapter
//! consumes only the change-tracking contract; it knows nothing about the
//! registry's internals.
//!
//! A change is "effective" when `previous_value != new_value` under the
//! value type's `PartialEq`. Freshly constructed composites therefore count
//! as changed whenever any field differs, while rewriting an equal primitive
//! never touches the surface.

use std::fmt::Display;
use std::sync::{Arc, RwLock};

use super::cell::{Cell, ChangeEvent};
use super::track::{track_changes, TrackHandle};

/// A surface that can display a cell's stringified value.
///
/// `set_text` renders content as inert text (escaping is the surface's
/// duty); `set_markup` hands the string over verbatim.
pub trait SyncSurface: Send + Sync {
    /// Display `text` as escaped, inert content.
    fn set_text(&self, text: &str);

    /// Display `markup` verbatim, trusting it as raw markup.
    fn set_markup(&self, markup: &str);
}

/// Options for [`sync_with`].
pub struct SyncOptions<T> {
    /// Mirror via [`SyncSurface::set_markup`] instead of `set_text`.
    pub mirror_as_raw_markup: bool,
    /// Invoked after each mirrored change with the event that caused it.
    pub on_synced: Option<Arc<dyn Fn(ChangeEvent<T>) + Send + Sync>>,
}

impl<T> Default for SyncOptions<T> {
    fn default() -> Self {
        Self {
            mirror_as_raw_markup: false,
            on_synced: None,
        }
    }
}

/// Keep `surface` in sync with `cell`.
///
/// On every change where the old and new values differ, writes the
/// stringified new value to the surface and then invokes `on_synced` if
/// present. Returns the underlying tracking handle; stopping it ends the
/// mirroring, and discarding it keeps the sync alive for the runtime's
/// lifetime.
pub fn sync_with<T, S>(cell: &Cell<T>, surface: Arc<S>, options: SyncOptions<T>) -> TrackHandle
where
    T: Clone + PartialEq + Display + Send + Sync + 'static,
    S: SyncSurface + 'static,
{
    track_changes(cell, move |event| {
        if event.previous_value == event.new_value {
            // Not an effective change; leave the surface alone.
            return;
        }

        let rendered = event.new_value.to_string();
        if options.mirror_as_raw_markup {
            surface.set_markup(&rendered);
        } else {
            surface.set_text(&rendered);
        }

        if let Some(on_synced) = &options.on_synced {
            on_synced(event);
        }
    })
}

/// An in-memory [`SyncSurface`] holding one string, usable headlessly and
/// in tests. Text mode escapes `&`, `<`, and `>`; markup mode stores the
/// string raw.
pub struct BufferSurface {
    content: RwLock<String>,
}

impl BufferSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self {
            content: RwLock::new(String::new()),
        }
    }

    /// The currently displayed content.
    pub fn content(&self) -> String {
        self.content.read().expect("content lock poisoned").clone()
    }
}

impl Default for BufferSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSurface for BufferSurface {
    fn set_text(&self, text: &str) {
        *self.content.write().expect("content lock poisoned") = escape_text(text);
    }

    fn set_markup(&self, markup: &str) {
        *self.content.write().expect("content lock poisoned") = markup.to_string();
    }
}

fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
