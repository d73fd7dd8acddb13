//! # HTTP Server Module
//!
//! Axum server for the dashboard API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/v1/auth`, `/api/v1/verify-token`, `/api/v1/logout` - Sessions
//! - `/api/v1/usercreate` - User administration
//! - `/api/v1/tasks` - Task listing
//! - `/api/v1/environments`, `/api/v1/webhooks`, `/api/v1/services` -
//!   Configuration listings and mutations
//! - `/api/v1/service/{name}` - Deployment overview of one service
//! - `/api/v1/documents`, `/api/v1/document/{name}` - Named JSON documents
//!
//! Protected routes read the session token from `X-CSRF-Token`.

pub mod auth_routes;
pub mod config;
pub mod config_routes;
pub mod errors;
pub mod guard;
pub mod health_routes;
pub mod list_routes;
pub mod server;
pub mod state;

pub use config::{BootstrapAdmin, ServerConfig};
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use guard::{Guard, TOKEN_HEADER};
pub use server::HttpServer;
pub use state::AppState;
