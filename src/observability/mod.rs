//! Observability for the dashboard core
//!
//! Structured JSON logging only. Logging is read-only and never changes
//! the outcome of the operation being logged.
//!
//! ```ignore
//! use cion::observability::Logger;
//!
//! Logger::warn("PERMISSION_DENIED", &[("path", "cion.user.create")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
