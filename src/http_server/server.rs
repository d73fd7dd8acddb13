//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::Logger;
use crate::permissions::PermissionResult;

use super::auth_routes::auth_routes;
use super::config::ServerConfig;
use super::config_routes::config_routes;
use super::health_routes::health_routes;
use super::list_routes::list_routes;
use super::state::AppState;

/// HTTP server for the dashboard API
pub struct HttpServer {
    state: Arc<AppState>,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with custom configuration
    pub fn with_config(config: ServerConfig) -> PermissionResult<Self> {
        Self::with_state(Arc::new(AppState::new(config)))
    }

    /// Create a server around existing state
    pub fn with_state(state: Arc<AppState>) -> PermissionResult<Self> {
        let router = Self::build_router(state.clone())?;
        Ok(Self { state, router })
    }

    /// Build the combined router with all endpoints
    pub fn build_router(state: Arc<AppState>) -> PermissionResult<Router> {
        let cors = if state.config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = state
                .config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Ok(Router::new()
            .merge(health_routes())
            .merge(auth_routes(state.clone())?)
            .merge(list_routes(state.clone()))
            .merge(config_routes(state)?)
            .layer(cors))
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.state.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address: {}", e),
            )
        })?;

        let addr_text = addr.to_string();
        Logger::info("SERVER_STARTING", &[("addr", addr_text.as_str())]);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}
