use std::error::Error;
use thiserror::Error;

use crate::dao::{changes::ApplyError, models::RecordId};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by sync backends regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered with an error.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A commit targeted a record the backend does not hold.
    #[error("record `{id}` not found")]
    NotFound {
        /// Missing record.
        id: RecordId,
    },
    /// A create reused an identifier or an account was bound twice.
    #[error("`{key}` already exists")]
    AlreadyExists {
        /// Record ID or account already taken.
        key: String,
    },
    /// The change does not apply to the stored record.
    #[error("change rejected for record `{id}`")]
    Rejected {
        /// Targeted record.
        id: RecordId,
        /// Why the change does not apply.
        #[source]
        source: ApplyError,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
