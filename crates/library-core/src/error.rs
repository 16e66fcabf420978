//! Error types for the personal library core.
//!
//! The taxonomy is deliberately small: callers distinguish an unavailable
//! store, a rejected write, a lookup miss and a failed search. Everything the
//! storage layer hits is returned through these variants, never logged and
//! dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing database could not be opened, or the catalog has not been
    /// initialized yet.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// An insert was rejected by the database.
    #[error("Write failed: {message}")]
    WriteFailed {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// A lookup found no matching record.
    #[error("Book not found: {key}")]
    NotFound { key: String },

    /// The full-text query could not be executed.
    #[error("Search failed: {message}")]
    SearchFailed {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// A stored row could not be converted into a book record.
    #[error("Invalid book record {key}: {message}")]
    InvalidRecord {
        key: String,
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub(crate) fn unavailable(message: impl Into<String>, err: rusqlite::Error) -> Self {
        CatalogError::StoreUnavailable {
            message: format!("{}: {}", message.into(), err),
            source: Some(err),
        }
    }

    pub(crate) fn write_failed(message: impl Into<String>, err: rusqlite::Error) -> Self {
        CatalogError::WriteFailed {
            message: format!("{}: {}", message.into(), err),
            source: Some(err),
        }
    }

    pub(crate) fn search_failed(message: impl Into<String>, err: rusqlite::Error) -> Self {
        CatalogError::SearchFailed {
            message: format!("{}: {}", message.into(), err),
            source: Some(err),
        }
    }

    /// Classify a failed book read: bad column data is an invalid record,
    /// anything else means the store could not be read.
    pub(crate) fn read_failed(key: impl Into<String>, err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnType(..) => CatalogError::InvalidRecord {
                key: key.into(),
                message: err.to_string(),
                source: Some(err),
            },
            err => CatalogError::unavailable("Unable to read book", err),
        }
    }

    /// Error returned by every operation on a catalog that has not been
    /// initialized.
    pub fn not_initialized() -> Self {
        CatalogError::StoreUnavailable {
            message: "catalog has not been initialized".to_string(),
            source: None,
        }
    }

    /// Error returned when the connection mutex was poisoned by a panicking
    /// writer.
    pub(crate) fn lock_poisoned() -> Self {
        CatalogError::StoreUnavailable {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        }
    }

    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True for a lookup miss, which is a normal negative result rather than
    /// a failure of the system.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    /// Map to an HTTP status code for the outer transport layer.
    ///
    /// - 404: lookup miss
    /// - 400: rejected write (typically malformed input)
    /// - 503: store unavailable or not initialized
    /// - 500: everything else
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::NotFound { .. } => 404,
            CatalogError::WriteFailed { .. } => 400,
            CatalogError::StoreUnavailable { .. } => 503,
            CatalogError::SearchFailed { .. }
            | CatalogError::InvalidRecord { .. }
            | CatalogError::Io { .. }
            | CatalogError::Config { .. } => 500,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<tokio::task::JoinError> for CatalogError {
    fn from(err: tokio::task::JoinError) -> Self {
        CatalogError::StoreUnavailable {
            message: format!("Blocking store task failed: {}", err),
            source: None,
        }
    }
}
