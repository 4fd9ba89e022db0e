//! Error types for the reactive kernel.
//!
//! The failure surface is deliberately tiny. Reads of unknown keys fall back
//! instead of failing, and unsubscribing an absent handler is silent, so the
//! only hard error left is a write addressed to a key the registry has never
//! seen. That is a programmer error and fails fast.

use thiserror::Error;

/// Errors raised by the keyed registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReactiveError {
    /// A write targeted a key with no cell record. Records are only created
    /// by cell constructors and never deleted, so this means the key never
    /// came from this registry.
    #[error("no cell record exists for key {0}")]
    UnknownKey(u64),
}
