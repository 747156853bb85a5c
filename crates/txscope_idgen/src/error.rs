//! Error types for identifier generation.

use std::path::PathBuf;
use thiserror::Error;
use txscope_core::PersistenceError;

/// Result type for identifier generation.
pub type IdResult<T> = Result<T, IdError>;

/// Errors raised by sequences, stores and generators.
#[derive(Debug, Error)]
pub enum IdError {
    /// A connection-level failure from the core.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The sequence store could not be reached.
    #[error("sequence store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// The store answered a next-value read without a value.
    #[error("sequence {sequence} returned no value")]
    NoValue {
        /// Qualified sequence name.
        sequence: String,
    },

    /// A value or block bound does not fit the identifier type.
    #[error("identifier overflow: {context}")]
    Overflow {
        /// What was being computed.
        context: String,
    },

    /// The sequence has not been created.
    #[error("sequence {sequence} does not exist")]
    SequenceNotFound {
        /// Qualified sequence name.
        sequence: String,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected value.
        message: String,
    },

    /// File store I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sequence file holds unreadable content.
    #[error("corrupted sequence file {}: {message}", path.display())]
    Corrupted {
        /// Path of the file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// No generator was registered for the requested key type.
    #[error("no identifier generator registered for {key}")]
    GeneratorNotRegistered {
        /// Name of the key type.
        key: &'static str,
    },
}

impl IdError {
    /// Creates a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a no-value error for `sequence`.
    pub fn no_value(sequence: impl ToString) -> Self {
        Self::NoValue {
            sequence: sequence.to_string(),
        }
    }

    /// Creates an overflow error.
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow {
            context: context.into(),
        }
    }

    /// Creates a sequence-not-found error.
    pub fn sequence_not_found(sequence: impl ToString) -> Self {
        Self::SequenceNotFound {
            sequence: sequence.to_string(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a corrupted file error.
    pub fn corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true when the store could not serve the request.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Self::StoreUnavailable { .. } | Self::Io(_) => true,
            Self::Persistence(e) => e.is_store_unavailable(),
            _ => false,
        }
    }

    /// Returns true when the store produced data that cannot be valid.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        match self {
            Self::NoValue { .. } | Self::Overflow { .. } | Self::Corrupted { .. } => true,
            Self::Persistence(e) => e.is_data_integrity(),
            _ => false,
        }
    }
}
