//! Store error types.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors that can occur while talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Duplicate value for unique field: {0}")]
    Duplicate(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl StoreError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }

    /// True if the store could not be reached or the link was misconfigured.
    pub fn is_connection(&self) -> bool {
        match self {
            StoreError::InvalidConnectionString(_) | StoreError::Connection(_) => true,
            StoreError::Database(e) => matches!(
                *e.kind,
                ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }

    /// Convert a write error, reporting unique index violations on `field`.
    pub(crate) fn from_write(err: mongodb::error::Error, field: &str) -> Self {
        let code = match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref write)) => Some(write.code),
            ErrorKind::Command(ref command) => Some(command.code),
            _ => None,
        };
        if code == Some(DUPLICATE_KEY_CODE) {
            return StoreError::Duplicate(field.to_string());
        }
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_classification() {
        assert!(StoreError::connection("refused").is_connection());
        assert!(StoreError::InvalidConnectionString("empty".into()).is_connection());
        assert!(!StoreError::invalid_id("xyz").is_connection());
        assert!(!StoreError::Duplicate("email".into()).is_connection());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::Duplicate("email".into()).to_string(),
            "Duplicate value for unique field: email"
        );
    }
}
