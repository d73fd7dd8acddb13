//! # Listing Errors
//!
//! Error types for list queries and the record store behind them.

use thiserror::Error;

use crate::search::SearchError;

/// Result type for listing operations
pub type ListingResult<T> = Result<T, ListError>;

/// Result type for record store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The store has no ordering for this field
    #[error("Cannot sort on field: {0}")]
    UnsortableField(String),

    /// Unknown collection
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// A record with this primary key already exists
    #[error("Duplicate primary key '{key}' in {collection}")]
    DuplicateKey { collection: String, key: String },

    /// Record is missing its primary key or is not an object
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Store could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// List query errors
#[derive(Debug, Clone, Error)]
pub enum ListError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Search text did not parse or compile
    #[error("Bad search term")]
    BadSearchTerm(#[source] SearchError),

    /// Requested sort field has no ordering in the store
    #[error("Cannot sort on requested field")]
    UnsortableField(String),

    /// Malformed paging parameters
    #[error("Invalid list request: {0}")]
    InvalidRequest(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Opaque store failure
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl ListError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ListError::BadSearchTerm(_) => 400,
            ListError::UnsortableField(_) => 400,
            ListError::InvalidRequest(_) => 400,
            ListError::Storage(StorageError::CollectionNotFound(_)) => 404,
            ListError::Storage(_) => 500,
        }
    }
}

impl From<StorageError> for ListError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsortableField(field) => ListError::UnsortableField(field),
            other => ListError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ParseError, ParseErrorKind};

    #[test]
    fn test_status_codes() {
        let parse = ParseError::new(ParseErrorKind::UnexpectedEnd, 0);
        assert_eq!(ListError::BadSearchTerm(parse.into()).status_code(), 400);
        assert_eq!(ListError::UnsortableField("x".into()).status_code(), 400);
        assert_eq!(
            ListError::Storage(StorageError::Unavailable("down".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_unsortable_storage_error_maps_to_list_error() {
        let err: ListError = StorageError::UnsortableField("image-name".into()).into();
        assert!(matches!(err, ListError::UnsortableField(f) if f == "image-name"));
    }

    #[test]
    fn test_user_visible_messages() {
        let parse = ParseError::new(ParseErrorKind::UnexpectedEnd, 0);
        assert_eq!(ListError::BadSearchTerm(parse.into()).to_string(), "Bad search term");
        assert_eq!(
            ListError::UnsortableField("x".into()).to_string(),
            "Cannot sort on requested field"
        );
    }
}
