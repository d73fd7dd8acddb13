//! Shared server state
//!
//! One instance per server, shared by every handler behind an `Arc`.

use std::sync::Arc;

use serde_json::json;

use crate::auth::crypto::validate_password;
use crate::auth::{AuthResult, AuthService, InMemoryUserRepository, User, UserRepository};
use crate::listing::{InMemoryRecordSource, ListQueryExecutor};
use crate::observability::Logger;
use crate::search::CompiledQueryCache;

use super::config::ServerConfig;

pub const TASKS: &str = "tasks";
pub const ENVIRONMENTS: &str = "environments";
pub const WEBHOOKS: &str = "webhooks";
pub const SERVICES: &str = "services";
pub const DOCUMENTS: &str = "documents";

/// State shared by all handlers
pub struct AppState {
    pub config: ServerConfig,
    pub auth: AuthService<InMemoryUserRepository>,
    pub records: Arc<InMemoryRecordSource>,
    pub lister: ListQueryExecutor<InMemoryRecordSource>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let records = Arc::new(
            InMemoryRecordSource::new()
                .with_collection(TASKS, "id", &["time", "event", "status"])
                .with_collection(ENVIRONMENTS, "name", &["time"])
                .with_collection(WEBHOOKS, "id", &["time"])
                .with_collection(SERVICES, "name", &["time"])
                .with_collection(DOCUMENTS, "name", &[]),
        );
        let cache = Arc::new(CompiledQueryCache::new(config.search_cache_capacity));
        let lister = ListQueryExecutor::with_cache(records.clone(), cache);

        Self {
            config,
            auth: AuthService::new(Arc::new(InMemoryUserRepository::new())),
            records,
            lister,
        }
    }

    /// Create the configured admin account unless it already exists.
    ///
    /// The configured password must meet the same strength rule as any
    /// other account, even when the account already exists.
    pub fn bootstrap(&self) -> AuthResult<()> {
        let admin = match &self.config.bootstrap_admin {
            Some(admin) => admin,
            None => return Ok(()),
        };
        validate_password(&admin.password)?;

        if self.auth.users().find(&admin.username)?.is_some() {
            return Ok(());
        }

        let user = User::new(
            &admin.username,
            &admin.password,
            json!({"cion": {"user": ["create"], "config": ["edit"]}}),
        )?;
        self.auth.users().create(&user)?;

        Logger::info("ADMIN_BOOTSTRAPPED", &[("username", user.username.as_str())]);
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::http_server::BootstrapAdmin;

    fn config_with_admin(password: &str) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.bootstrap_admin = Some(BootstrapAdmin {
            username: "admin".to_string(),
            password: password.to_string(),
        });
        config
    }

    #[test]
    fn test_bootstrap_creates_admin_once() {
        let state = AppState::new(config_with_admin("correct-horse-battery"));
        state.bootstrap().unwrap();
        state.bootstrap().unwrap();
        assert!(state.auth.users().find("admin").unwrap().is_some());
    }

    #[test]
    fn test_bootstrap_rejects_weak_password() {
        let state = AppState::new(config_with_admin("short"));
        let err = state.bootstrap().unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
        assert!(state.auth.users().find("admin").unwrap().is_none());
    }
}
