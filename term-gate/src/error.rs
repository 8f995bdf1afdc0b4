//! Error types for term-gate.
//!
//! [`TermError`] covers configuration, adapter and cancellation failures. Field
//! level validation failures are not errors in this sense: they are collected
//! into a [`ValidationErrors`](crate::core::ValidationErrors) report.

use thiserror::Error;

/// Result type used throughout term-gate.
pub type Result<T> = std::result::Result<T, TermError>;

/// Errors raised by term-gate components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    /// Invalid options or configuration values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An identifier or operator was rejected before it reached a backing store.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// The validation call was cancelled before the lookup was dispatched.
    #[error("operation cancelled")]
    Cancelled,

    /// An adapter was used without a configured connection.
    #[error("no database connection configured")]
    NoConnection,

    /// The backing store failed to answer an existence query.
    #[error("lookup on '{table}' failed: {message}")]
    Checker {
        /// Table the failed lookup targeted
        table: String,
        /// Error reported by the store
        message: String,
    },

    /// A field path could not be resolved or written.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Unexpected internal failure, such as a panicked lookup task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TermError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a checker error for the given table.
    pub fn checker(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Checker {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error represents cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TermError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TermError::Cancelled.to_string(), "operation cancelled");
        assert_eq!(
            TermError::checker("users", "timeout").to_string(),
            "lookup on 'users' failed: timeout"
        );
        assert_eq!(
            TermError::NoConnection.to_string(),
            "no database connection configured"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(TermError::Cancelled.is_cancelled());
        assert!(!TermError::Internal("x".into()).is_cancelled());
    }
}
