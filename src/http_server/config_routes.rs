//! Configuration HTTP Routes
//!
//! Environments, webhooks, services and documents. Reads need a session;
//! writes need `cion.config.edit`. Creating a service is also allowed to a
//! user holding `service` under every environment the service is deployed
//! to. Documents are free-form JSON keyed by `name` and writable by any
//! session.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::listing::StorageError;
use crate::permissions::{BodyFieldResolver, PermissionExpr, PermissionResult};

use super::errors::{parse_json_body, ApiError, ApiResult};
use super::guard::{guarded, Guard};
use super::list_routes::{list_environments, list_services, list_webhooks};
use super::state::{AppState, DOCUMENTS, ENVIRONMENTS, SERVICES, TASKS, WEBHOOKS};

pub const CONFIG_EDIT: &str = "cion.config.edit";
pub const ENVIRONMENT_SERVICE: &str = "cion.environment.$environments.service";

/// Document holding the image-name pattern used to match tasks to services
pub const GLOB_DOCUMENT: &str = "glob";

/// Pattern applied when no `glob` document exists: the repository part of
/// `repository:tag`
pub const DEFAULT_IMAGE_GLOB: &str = "^([^:]+)";

/// Configuration routes with shared state
pub fn config_routes(state: Arc<AppState>) -> PermissionResult<Router> {
    let session = Guard::session(&state);
    let edit = Guard::permission(&state, PermissionExpr::path(CONFIG_EDIT)?);
    let deploy = Guard::permission(&state, service_permission()?);

    Ok(Router::new()
        .route(
            "/api/v1/environments",
            guarded(get(list_environments), session.clone())
                .merge(guarded(post(create_environment), edit.clone())),
        )
        .route(
            "/api/v1/webhooks",
            guarded(get(list_webhooks), session.clone())
                .merge(guarded(post(create_webhook), edit.clone())),
        )
        .route(
            "/api/v1/webhooks/:id",
            guarded(get(get_webhook), session.clone())
                .merge(guarded(axum::routing::delete(delete_webhook), edit)),
        )
        .route(
            "/api/v1/services",
            guarded(get(list_services), session.clone())
                .merge(guarded(post(create_service), deploy)),
        )
        .route("/api/v1/service/:name", guarded(get(get_service), session.clone()))
        .route(
            "/api/v1/documents",
            guarded(get(list_documents).post(save_document), session.clone()),
        )
        .route("/api/v1/document/:name", guarded(get(get_document), session))
        .with_state(state))
}

/// `cion.config.edit | cion.environment.$environments.service`, with
/// `$environments` read from the request body
pub fn service_permission() -> PermissionResult<PermissionExpr> {
    let resolver = Arc::new(BodyFieldResolver::new().bind("environments", "environments"));
    Ok(PermissionExpr::path(CONFIG_EDIT)?
        | PermissionExpr::path_with(ENVIRONMENT_SERVICE, resolver)?)
}

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
pub struct EnvironmentRequest {
    pub name: String,
    pub mode: String,
    #[serde(rename = "tag-match")]
    pub tag_match: String,
    #[serde(default)]
    pub tls: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub url: String,
    pub event: String,
    #[serde(default)]
    pub on: Value,
    #[serde(default)]
    pub headers: Value,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    #[serde(rename = "service-name")]
    pub name: String,
    pub environments: Vec<String>,
    #[serde(rename = "image-name")]
    pub image_name: String,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Letters, digits, `_` and `-` only
fn is_url_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn deploy_time(task: &Value) -> f64 {
    task["time"].as_f64().unwrap_or(f64::MIN)
}

/// Deployment overview of one service.
///
/// A task belongs to the service when the first capture group of `glob`
/// applied to the task's `image-name` contains the service's `image-name`.
/// Each configured environment reports the image of its latest successful
/// `update-service` task, or `"NA"` when none exists.
pub fn service_overview(service: &Value, tasks: &[Value], glob: &str) -> ApiResult<Value> {
    let pattern = Regex::new(glob)
        .map_err(|e| ApiError::Unprocessable(format!("Invalid image glob: {}", e)))?;
    let base_name = service["image-name"].as_str().unwrap_or_default();

    let matching: Vec<&Value> = tasks
        .iter()
        .filter(|task| {
            task["image-name"]
                .as_str()
                .and_then(|name| pattern.captures(name))
                .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| m.as_str().contains(base_name))
                .unwrap_or(false)
        })
        .collect();

    let mut latest: HashMap<&str, &Value> = HashMap::new();
    for task in matching.iter().copied().filter(|t| {
        t["status"] == "done" && t["event"] == "update-service"
    }) {
        let Some(env) = task["environment"].as_str() else {
            continue;
        };
        match latest.get(env) {
            Some(current) if deploy_time(current) >= deploy_time(task) => {}
            _ => {
                latest.insert(env, task);
            }
        }
    }

    let configured: BTreeSet<&str> = service["environments"]
        .as_array()
        .map(|envs| envs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut environments = serde_json::Map::new();
    for env in configured {
        let running = match latest.get(env) {
            Some(task) => json!({"image-name": task["image-name"], "time": task["time"]}),
            None => json!({"image-name": "NA", "time": null}),
        };
        environments.insert(env.to_string(), running);
    }

    let deployed: BTreeSet<&str> = matching
        .iter()
        .filter_map(|task| task["image-name"].as_str())
        .collect();

    Ok(json!({
        "environments": environments,
        "images-deployed": deployed.into_iter().rev().collect::<Vec<_>>(),
    }))
}

// ==================
// Handlers
// ==================

async fn create_environment(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request: EnvironmentRequest = parse_json_body(&body)?;

    let mut record = json!({
        "name": request.name,
        "mode": request.mode,
        "tag-match": request.tag_match,
        "time": now(),
    });
    if let Some(tls) = request.tls {
        record["tls"] = tls;
    }

    match state.records.insert(ENVIRONMENTS, record) {
        Ok(_) => Ok(Json(json!({"msg": "Environment created"}))),
        Err(StorageError::DuplicateKey { key, .. }) => Err(ApiError::Unprocessable(format!(
            "Environment with name '{}' already exists",
            key
        ))),
        Err(e) => Err(e.into()),
    }
}

async fn create_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request: WebhookRequest = parse_json_body(&body)?;
    let id = Uuid::new_v4().to_string();

    state.records.insert(
        WEBHOOKS,
        json!({
            "id": id,
            "url": request.url,
            "event": request.event,
            "on": request.on,
            "headers": request.headers,
            "data": request.data,
            "time": now(),
        }),
    )?;

    Ok(Json(json!({"msg": "Webhook created", "id": id})))
}

async fn get_webhook(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .records
        .get(WEBHOOKS, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Webhook '{}' not found", id)))
}

async fn delete_webhook(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    match state.records.delete(WEBHOOKS, &id)? {
        Some(_) => Ok(Json(json!({"msg": "Webhook deleted"}))),
        None => Err(ApiError::NotFound(format!("Webhook '{}' not found", id))),
    }
}

async fn create_service(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let request: ServiceRequest = parse_json_body(&body)?;

    if !is_url_safe(&request.name) {
        return Err(ApiError::Unprocessable("Invalid service name".to_string()));
    }
    if !is_url_safe(&request.image_name) {
        return Err(ApiError::Unprocessable("Invalid image name".to_string()));
    }

    let record = json!({
        "name": request.name,
        "environments": request.environments,
        "image-name": request.image_name,
        "time": now(),
    });

    match state.records.insert(SERVICES, record) {
        Ok(_) => Ok((StatusCode::CREATED, Json(json!({"msg": "Service created"})))),
        Err(StorageError::DuplicateKey { key, .. }) => Err(ApiError::Unprocessable(format!(
            "Service '{}' already exists",
            key
        ))),
        Err(e) => Err(e.into()),
    }
}

async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let service = state
        .records
        .get(SERVICES, &name)?
        .ok_or_else(|| ApiError::NotFound("Service is not configured".to_string()))?;

    let glob = state
        .records
        .get(DOCUMENTS, GLOB_DOCUMENT)?
        .and_then(|doc| doc["document"].as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_IMAGE_GLOB.to_string());
    let tasks = state.records.scan(TASKS, |_| true)?;

    service_overview(&service, &tasks, &glob).map(Json)
}

async fn list_documents(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let documents = state
        .records
        .scan(DOCUMENTS, |doc| doc["plaintext-editable"] == Value::Bool(true))?;
    Ok(Json(Value::Array(documents)))
}

async fn save_document(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let document: Value = parse_json_body(&body)?;
    if !document["name"].is_string() {
        return Err(ApiError::Unprocessable("Document needs a name".to_string()));
    }

    state.records.upsert(DOCUMENTS, document)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Successfully save document"})),
    ))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .records
        .get(DOCUMENTS, &name)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Document '{}' not found", name)))
}
