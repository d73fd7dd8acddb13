//! # Auth Errors
//!
//! Error types for the authentication module.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Authentication Errors
    // ==================

    /// Unknown user or wrong password (never says which)
    #[error("Bad credentials")]
    InvalidCredentials,

    /// Missing or unknown session token
    #[error("Bad credentials")]
    SessionInvalid,

    // ==================
    // Authorization Errors
    // ==================

    /// Session lacks one or more capabilities
    #[error("You don't have the correct permissions to perform this action. Missing: {}", .missing.join(","))]
    Forbidden { missing: Vec<String> },

    // ==================
    // User Validation Errors
    // ==================

    /// Required field left empty
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Password does not meet requirements
    #[error("{0}")]
    WeakPassword(String),

    /// Password and its repetition differ
    #[error("Password and repeat-password must match")]
    PasswordMismatch,

    /// Username already taken
    #[error("User '{0}' already exists")]
    UserExists(String),

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 401 Unauthorized
            AuthError::InvalidCredentials => 401,
            AuthError::SessionInvalid => 401,

            // 403 Forbidden
            AuthError::Forbidden { .. } => 403,

            // 422 Unprocessable Entity
            AuthError::EmptyField(_) => 422,
            AuthError::WeakPassword(_) => 422,
            AuthError::PasswordMismatch => 422,
            AuthError::UserExists(_) => 422,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    /// Whether this error should be logged as a failure
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}
