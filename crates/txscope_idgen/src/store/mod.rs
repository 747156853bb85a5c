//! Durable sequence stores.
//!
//! A store keeps any number of named counters and offers three calls per
//! counter: an existence check, creation, and an atomic read-and-advance.
//! Values cross the store boundary as `i64`; [`Sequence`](crate::Sequence)
//! converts them into the identifier type.

mod file;
mod memory;
mod sql;

pub use file::FileSequenceStore;
pub use memory::InMemorySequenceStore;
pub use sql::{SequenceDialect, SqlSequenceStore};

use crate::error::IdResult;
use std::fmt;
use std::sync::Arc;

/// Qualified name of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceName {
    schema: Option<String>,
    name: String,
}

impl SequenceName {
    /// Creates a name.
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Returns the schema, if one was given.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the unqualified name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SequenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Storage backing one or more durable sequences.
///
/// # Invariants
///
/// - `next_value` atomically returns the current value and advances it by
///   the sequence's increment; concurrent callers never observe the same
///   value
/// - `create` on an existing sequence is the caller's mistake; use
///   [`Sequence::ensure_sequence`](crate::Sequence::ensure_sequence)
pub trait SequenceStore: Send + Sync {
    /// Returns true if the sequence exists.
    ///
    /// # Errors
    ///
    /// Returns a store error if the check cannot be performed.
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool>;

    /// Creates the sequence.
    ///
    /// # Errors
    ///
    /// Returns a store error if creation fails.
    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()>;

    /// Reads and advances the sequence. `None` means the store answered
    /// without a value.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails or the sequence is missing.
    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>>;
}

impl<S: SequenceStore + ?Sized> SequenceStore for Arc<S> {
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool> {
        (**self).exists(sequence)
    }

    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()> {
        (**self).create(sequence, start_with, increment)
    }

    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>> {
        (**self).next_value(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_schema() {
        assert_eq!(
            SequenceName::new(Some("sales".into()), "order_ids").to_string(),
            "sales.order_ids"
        );
        assert_eq!(SequenceName::new(None, "order_ids").to_string(), "order_ids");
    }
}
