//! # User Management
//!
//! User model and repository. Users are keyed by their lowercased username
//! and carry the permission tree their sessions are checked against.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::crypto::{gravatar_url, hash_password, validate_password, verify_password};
use super::errors::{AuthError, AuthResult};

/// User model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Lowercased, unique
    pub username: String,

    /// Argon2id password hash (never plaintext)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Nested object whose leaves are arrays of granted capabilities
    #[serde(default = "empty_tree")]
    pub permissions: Value,

    #[serde(rename = "gravatar-email", default, skip_serializing_if = "Option::is_none")]
    pub gravatar_email: Option<String>,

    /// Epoch seconds
    pub time_created: i64,
}

fn empty_tree() -> Value {
    Value::Object(Default::default())
}

impl User {
    /// Build a user with a freshly hashed password
    pub fn new(username: &str, password: &str, permissions: Value) -> AuthResult<Self> {
        Ok(Self {
            username: normalize_username(username),
            password_hash: hash_password(password)?,
            permissions,
            gravatar_email: None,
            time_created: Utc::now().timestamp(),
        })
    }

    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }

    /// Avatar for the configured gravatar email, falling back to the username
    pub fn gravatar_url(&self) -> String {
        match self.gravatar_email.as_deref() {
            Some(email) if !email.is_empty() => gravatar_url(email),
            _ => gravatar_url(&self.username),
        }
    }

    /// Public profile returned on login
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            gravatar_url: self.gravatar_url(),
            gravatar_email: self.gravatar_email.clone().unwrap_or_default(),
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(rename = "gravatar-url")]
    pub gravatar_url: String,
    #[serde(rename = "gravatar-email")]
    pub gravatar_email: String,
}

/// User creation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "repeat-password", default)]
    pub repeat_password: String,
    #[serde(default = "empty_tree")]
    pub permissions: Value,
}

impl CreateUserRequest {
    /// Validation in the order users see the errors
    pub fn validate(&self) -> AuthResult<()> {
        if self.username.trim().is_empty() {
            return Err(AuthError::EmptyField("Username"));
        }
        if self.password.is_empty() {
            return Err(AuthError::EmptyField("Password"));
        }
        validate_password(&self.password)?;
        if self.repeat_password != self.password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(())
    }
}

/// User login request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Lowercase and trim a username
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// User repository trait
///
/// Abstracts storage operations for users.
pub trait UserRepository: Send + Sync {
    /// Find a user by (normalized) username
    fn find(&self, username: &str) -> AuthResult<Option<User>>;

    /// Insert a new user; fails with `UserExists` on a taken username
    fn create(&self, user: &User) -> AuthResult<()>;

    /// Replace an existing user
    fn update(&self, user: &User) -> AuthResult<()>;

    /// Delete a user, returning whether it existed
    fn delete(&self, username: &str) -> AuthResult<bool>;
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.get(&normalize_username(username)).cloned())
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;

        if users.contains_key(&user.username) {
            return Err(AuthError::UserExists(user.username.clone()));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;

        match users.get_mut(&user.username) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::StorageError(format!(
                "User '{}' not found",
                user.username
            ))),
        }
    }

    fn delete(&self, username: &str) -> AuthResult<bool> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.remove(&normalize_username(username)).is_some())
    }
}
