//! Auth HTTP Routes
//!
//! Login, token verification, logout and user creation.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{AuthError, CreateUserRequest, LoginRequest, LoginResponse, Session};
use crate::permissions::{PermissionExpr, PermissionResult};

use super::errors::{parse_json_body, ApiResult};
use super::guard::{guarded, request_token, Guard};
use super::state::AppState;

pub const USER_CREATE: &str = "cion.user.create";

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> PermissionResult<Router> {
    let create_user = Guard::permission(&state, PermissionExpr::path(USER_CREATE)?);

    Ok(Router::new()
        .route("/api/v1/auth", post(login_handler))
        .route("/api/v1/verify-token", guarded(get(verify_handler), Guard::session(&state)))
        .route("/api/v1/logout", post(logout_handler))
        .route("/api/v1/usercreate", guarded(post(create_user_handler), create_user))
        .with_state(state))
}

// ==================
// Handlers
// ==================

/// Login handler. Any failure is a plain 401.
async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<LoginResponse>> {
    let request: LoginRequest = parse_json_body(&body).map_err(|_| AuthError::InvalidCredentials)?;
    let response = state.auth.login(&request.username, &request.password)?;
    Ok(Json(response))
}

async fn verify_handler(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({"username": session.user.username}))
}

async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let message = if state.auth.logout(request_token(&headers))? {
        "session popped; user was logged out"
    } else {
        "token does not exist, so user has no session"
    };
    Ok(Json(json!({"message": message})))
}

async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let request: CreateUserRequest = parse_json_body(&body)?;
    let user = state.auth.create_user(&request)?;
    Ok((StatusCode::CREATED, Json(json!({"username": user.username}))))
}
