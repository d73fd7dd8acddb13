//! # Auth Service
//!
//! Login, logout and user administration over a user repository and the
//! session store.

use std::sync::Arc;

use serde::Serialize;

use crate::observability::Logger;

use super::errors::{AuthError, AuthResult};
use super::session::{Session, SessionStore};
use super::user::{normalize_username, CreateUserRequest, User, UserProfile, UserRepository};

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Auth service combining users and sessions
pub struct AuthService<U: UserRepository> {
    users: Arc<U>,
    sessions: SessionStore,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self {
            users,
            sessions: SessionStore::new(),
        }
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Validate and store a new user
    pub fn create_user(&self, request: &CreateUserRequest) -> AuthResult<User> {
        request.validate()?;

        let user = User::new(&request.username, &request.password, request.permissions.clone())?;
        self.users.create(&user)?;

        Logger::info("USER_CREATED", &[("username", user.username.as_str())]);
        Ok(user)
    }

    /// Check credentials and open a session
    pub fn login(&self, username: &str, password: &str) -> AuthResult<LoginResponse> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .users
            .find(&username)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(password)? {
            Logger::warn("LOGIN_FAILED", &[("username", username.as_str())]);
            return Err(AuthError::InvalidCredentials);
        }

        let profile = user.profile();
        let token = self.sessions.create(user)?;

        Ok(LoginResponse {
            token,
            user: profile,
        })
    }

    /// Session for a raw token
    pub fn verify(&self, token: &str) -> AuthResult<Session> {
        self.sessions.get(token)
    }

    /// End a session. Unknown tokens are not an error.
    pub fn logout(&self, token: &str) -> AuthResult<bool> {
        self.sessions.destroy(token)
    }

    /// Store a changed user and push it into that user's live sessions
    pub fn update_user(&self, user: &User) -> AuthResult<()> {
        self.users.update(user)?;
        self.sessions.refresh_user(user)?;
        Ok(())
    }

    /// Delete a user and end all of their sessions
    pub fn delete_user(&self, username: &str) -> AuthResult<bool> {
        let existed = self.users.delete(username)?;
        self.sessions.invalidate_user(username)?;
        Ok(existed)
    }
}
