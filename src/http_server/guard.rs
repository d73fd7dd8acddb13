//! Session and permission guard
//!
//! Middleware placed in front of protected routes:
//!
//! 1. `X-CSRF-Token` must name a live session, otherwise 401
//! 2. With a permission expression, the session's permission tree is
//!    checked; the request body is buffered first so placeholders can be
//!    read from it, then handed on unchanged
//! 3. A denial answers 403 listing every missing capability path
//!
//! The session is inserted into request extensions for the handler.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::auth::AuthError;
use crate::observability::Logger;
use crate::permissions::{CheckContext, DenialReasons, PermissionExpr};

use super::errors::{ApiError, ApiResult};
use super::state::AppState;

/// Header carrying the session token
pub const TOKEN_HEADER: &str = "X-CSRF-Token";

/// Guard configuration for one route
#[derive(Clone)]
pub struct Guard {
    state: Arc<AppState>,
    expr: Option<Arc<PermissionExpr>>,
}

impl Guard {
    /// Any live session passes
    pub fn session(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
            expr: None,
        }
    }

    /// Session must also satisfy `expr`
    pub fn permission(state: &Arc<AppState>, expr: PermissionExpr) -> Self {
        Self {
            state: state.clone(),
            expr: Some(Arc::new(expr)),
        }
    }
}

/// Put `route` behind `guard`. Layers apply per method, so one path can
/// carry different guards for reads and writes.
pub fn guarded(route: MethodRouter<Arc<AppState>>, guard: Guard) -> MethodRouter<Arc<AppState>> {
    route.layer(middleware::from_fn_with_state(guard, authorize))
}

/// Raw token from request headers, empty when absent
pub fn request_token(headers: &axum::http::HeaderMap) -> &str {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Middleware entry point, used with `middleware::from_fn_with_state`
pub async fn authorize(
    State(guard): State<Guard>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let session = guard.state.auth.verify(request_token(request.headers()))?;

    let mut request = match &guard.expr {
        None => request,
        Some(expr) => {
            let (mut parts, body) = request.into_parts();
            let limit = guard.state.config.max_body_bytes;
            // Reading only fails past the limit or on a broken stream
            let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
                ApiError::PayloadTooLarge(format!("Request body exceeds {} bytes", limit))
            })?;

            let mut params: HashMap<String, String> =
                Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                    .map(|Query(q)| q)
                    .unwrap_or_default();
            if let Ok(path_params) = RawPathParams::from_request_parts(&mut parts, &()).await {
                for (name, value) in path_params.iter() {
                    params.insert(name.to_string(), value.to_string());
                }
            }

            let ctx = CheckContext {
                body: bytes.to_vec(),
                params,
            };

            let mut reasons = DenialReasons::new();
            let allowed = expr
                .check(&session.user.permissions, &mut reasons, &ctx)
                .await?;

            if !allowed {
                let missing = reasons.into_vec();
                let joined = missing.join(",");
                Logger::warn(
                    "PERMISSION_DENIED",
                    &[
                        ("missing", joined.as_str()),
                        ("path", parts.uri.path()),
                        ("username", session.user.username.as_str()),
                    ],
                );
                return Err(AuthError::Forbidden { missing }.into());
            }

            Request::from_parts(parts, Body::from(bytes))
        }
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
