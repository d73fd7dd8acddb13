//! Listing HTTP Routes
//!
//! Paginated collection listings. Query parameters:
//! `pageStart`, `pageLength`, `sortIndex`, `reverseSort`, `searchTerm`.
//! Responses are `{"rows": [...], "totalLength": n}`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::listing::{ListRequest, ListResult};

use super::errors::ApiResult;
use super::guard::{guarded, Guard};
use super::state::{AppState, ENVIRONMENTS, SERVICES, TASKS, WEBHOOKS};

/// Task listing route. The configuration collections register their
/// listings next to their mutations in `config_routes`.
pub fn list_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/tasks", guarded(get(list_tasks), Guard::session(&state)))
        .with_state(state)
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResult>> {
    list(&state, TASKS, &params).await
}

pub(super) async fn list_environments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResult>> {
    list(&state, ENVIRONMENTS, &params).await
}

pub(super) async fn list_webhooks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResult>> {
    list(&state, WEBHOOKS, &params).await
}

pub(super) async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResult>> {
    list(&state, SERVICES, &params).await
}

async fn list(
    state: &AppState,
    collection: &str,
    params: &HashMap<String, String>,
) -> ApiResult<Json<ListResult>> {
    let request = ListRequest::from_query(params, &state.config.page_limits())?;
    let result = state.lister.execute(collection, &request).await?;
    Ok(Json(result))
}
