//! HTTP Server Configuration
//!
//! Bind address, CORS, listing limits and request size limits. Every field
//! has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::auth::crypto::validate_password;
use crate::listing::PageLimits;

/// Account created at startup when the user store is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Rows per page when `pageLength` is absent
    #[serde(default = "default_page_length")]
    pub default_page_length: usize,

    /// Largest accepted `pageLength`
    #[serde(default = "default_max_page_length")]
    pub max_page_length: usize,

    /// Compiled search queries kept in memory
    #[serde(default = "default_search_cache_capacity")]
    pub search_cache_capacity: usize,

    /// Largest request body read by guarded routes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_page_length() -> usize {
    25
}

fn default_max_page_length() -> usize {
    1000
}

fn default_search_cache_capacity() -> usize {
    256
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
} // 1 MiB

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            default_page_length: default_page_length(),
            max_page_length: default_max_page_length(),
            search_cache_capacity: default_search_cache_capacity(),
            max_body_bytes: default_max_body_bytes(),
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_length: self.default_page_length,
            max_page_length: self.max_page_length,
        }
    }

    /// Check value ranges, returning a description of the first problem
    pub fn validate(&self) -> Result<(), String> {
        if self.default_page_length == 0 {
            return Err("default_page_length must be > 0".to_string());
        }
        if self.max_page_length == 0 {
            return Err("max_page_length must be > 0".to_string());
        }
        if self.default_page_length > self.max_page_length {
            return Err(format!(
                "default_page_length ({}) must not exceed max_page_length ({})",
                self.default_page_length, self.max_page_length
            ));
        }
        if self.search_cache_capacity == 0 {
            return Err("search_cache_capacity must be > 0".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("max_body_bytes must be > 0".to_string());
        }
        if let Some(admin) = &self.bootstrap_admin {
            if admin.username.trim().is_empty() {
                return Err("bootstrap_admin.username must not be empty".to_string());
            }
            validate_password(&admin.password)
                .map_err(|e| format!("bootstrap_admin.password: {}", e))?;
        }
        Ok(())
    }
}
