//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code. Diagnostic
//! commands also print the error as their JSON response.

use thiserror::Error;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Errors raised by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file unreadable, malformed or invalid
    #[error("{0}")]
    Config(String),

    /// Writing the response failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command argument was rejected
    #[error("{0}")]
    InvalidInput(String),

    /// Server could not start
    #[error("{0}")]
    BootFailed(String),
}

impl CliError {
    /// Stable error code printed with the message
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CION_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "CION_CLI_IO_ERROR",
            CliError::InvalidInput(_) => "CION_CLI_INVALID_INPUT",
            CliError::BootFailed(_) => "CION_CLI_BOOT_FAILED",
        }
    }
}
