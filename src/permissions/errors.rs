//! # Permission Errors
//!
//! A denied check is not an error: it is `Ok(false)` plus reported
//! reasons. Errors here mean the check itself could not be carried out.

use thiserror::Error;

/// Result type for permission operations
pub type PermissionResult<T> = Result<T, PermissionError>;

/// Permission evaluation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Path text is not a valid permission path
    #[error("Invalid permission path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Placeholder values could not be obtained from the request
    #[error("Placeholder resolution failed: {0}")]
    Resolver(String),
}

impl PermissionError {
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        PermissionError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PermissionError::InvalidPath { .. } => 500,
            PermissionError::Resolver(_) => 400,
        }
    }
}
