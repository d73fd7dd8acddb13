//! # Session Management
//!
//! Token → session map held in process. Tokens are handed to the client
//! once and stored only as SHA-256 digests.
//!
//! Sessions carry a copy of their user. When a user record changes,
//! [`SessionStore::refresh_user`] pushes the new record into every live
//! session so permission changes apply without logging out.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::Logger;

use super::crypto::{generate_token, hash_token};
use super::errors::{AuthError, AuthResult};
use super::user::{normalize_username, User};

/// A live login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub created_at: DateTime<Utc>,
}

/// Process-wide session registry
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `user`, returning the raw token
    pub fn create(&self, user: User) -> AuthResult<String> {
        let token = generate_token();
        let username = user.username.clone();

        self.write()?.insert(
            hash_token(&token),
            Session {
                user,
                created_at: Utc::now(),
            },
        );

        Logger::info("SESSION_CREATED", &[("username", username.as_str())]);
        Ok(token)
    }

    /// Look up the session for a raw token
    pub fn get(&self, token: &str) -> AuthResult<Session> {
        self.read()?
            .get(&hash_token(token))
            .cloned()
            .ok_or(AuthError::SessionInvalid)
    }

    /// End one session (logout). Returns whether it existed.
    pub fn destroy(&self, token: &str) -> AuthResult<bool> {
        let removed = self.write()?.remove(&hash_token(token));

        if let Some(session) = &removed {
            Logger::info(
                "SESSION_INVALIDATED",
                &[("reason", "logout"), ("username", session.user.username.as_str())],
            );
        }
        Ok(removed.is_some())
    }

    /// End every session of a user, returning how many were ended
    pub fn invalidate_user(&self, username: &str) -> AuthResult<usize> {
        let username = normalize_username(username);
        let mut sessions = self.write()?;

        let before = sessions.len();
        sessions.retain(|_, session| session.user.username != username);
        let removed = before - sessions.len();

        if removed > 0 {
            let count = removed.to_string();
            Logger::info(
                "SESSION_INVALIDATED",
                &[
                    ("count", count.as_str()),
                    ("reason", "user"),
                    ("username", username.as_str()),
                ],
            );
        }
        Ok(removed)
    }

    /// Replace the user record in all of that user's sessions
    pub fn refresh_user(&self, user: &User) -> AuthResult<usize> {
        let mut sessions = self.write()?;
        let mut updated = 0;

        for session in sessions
            .values_mut()
            .filter(|s| s.user.username == user.username)
        {
            session.user = user.clone();
            updated += 1;
        }
        Ok(updated)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> AuthResult<std::sync::RwLockReadGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))
    }

    fn write(&self) -> AuthResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))
    }
}
