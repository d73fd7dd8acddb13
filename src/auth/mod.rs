//! # Authentication Module
//!
//! Users, password login and opaque session tokens. Authorization of a
//! session against a capability is done by [`crate::permissions`].

pub mod crypto;
pub mod errors;
pub mod service;
pub mod session;
pub mod user;

pub use errors::{AuthError, AuthResult};
pub use service::{AuthService, LoginResponse};
pub use session::{Session, SessionStore};
pub use user::{
    CreateUserRequest, InMemoryUserRepository, LoginRequest, User, UserProfile, UserRepository,
};
