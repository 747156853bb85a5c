//! Error types for txscope core.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type for core operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors raised by operations, decorators and their store collaborators.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// An operation or decorator was driven through an invalid lifecycle
    /// transition. These are programming errors and are never retried.
    #[error("invalid state: {message}")]
    StateViolation {
        /// Description of the violated transition.
        message: String,
    },

    /// The backing store could not be reached or rejected a request.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// The store answered with data that cannot be valid.
    #[error("data integrity violation: {message}")]
    DataIntegrity {
        /// Description of the inconsistency.
        message: String,
    },

    /// Business logic running inside the operation failed.
    #[error("operation failed: {0}")]
    Operation(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The invoker requested cancellation.
    #[error("operation cancelled")]
    Cancelled,

    /// A configuration value was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected value.
        message: String,
    },
}

impl PersistenceError {
    /// Creates a state violation error.
    pub fn state_violation(message: impl Into<String>) -> Self {
        Self::StateViolation {
            message: message.into(),
        }
    }

    /// Creates a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a data integrity error.
    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            message: message.into(),
        }
    }

    /// Wraps a business logic failure.
    pub fn operation(error: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Operation(error.into())
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for lifecycle violations.
    #[must_use]
    pub fn is_state_violation(&self) -> bool {
        matches!(self, Self::StateViolation { .. })
    }

    /// Returns true when the backing store failed.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Returns true when the store returned impossible data.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::DataIntegrity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(PersistenceError::state_violation("begin twice").is_state_violation());
        assert!(PersistenceError::store_unavailable("refused").is_store_unavailable());
        assert!(PersistenceError::data_integrity("null").is_data_integrity());
        assert!(!PersistenceError::Cancelled.is_state_violation());
    }

    #[test]
    fn operation_error_keeps_source() {
        let err = PersistenceError::operation("division by zero");
        assert_eq!(err.to_string(), "operation failed: division by zero");
        assert!(err.source().is_some());
    }

    #[test]
    fn error_display() {
        let err = PersistenceError::state_violation("transaction already committed");
        assert_eq!(
            err.to_string(),
            "invalid state: transaction already committed"
        );
        assert_eq!(PersistenceError::Cancelled.to_string(), "operation cancelled");
    }
}
