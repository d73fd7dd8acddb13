//! HTTP Route Tests
//!
//! Requests through the full router:
//! - Protected routes answer 401 without a live session
//! - Login issues a token accepted by `X-CSRF-Token`
//! - Permission denials answer 403 with every missing path
//! - Listings return `{"rows", "totalLength"}` and reject bad search terms
//! - Documents and service overviews read back what was stored

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use cion::http_server::{AppState, BootstrapAdmin, HttpServer, ServerConfig, TOKEN_HEADER};
use cion::http_server::state::TASKS;
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

const ADMIN: &str = "admin";
const ADMIN_PASSWORD: &str = "correct-horse-battery";

fn setup() -> (Arc<AppState>, Router) {
    setup_with(ServerConfig::default())
}

fn setup_with(mut config: ServerConfig) -> (Arc<AppState>, Router) {
    config.bootstrap_admin = Some(BootstrapAdmin {
        username: ADMIN.to_string(),
        password: ADMIN_PASSWORD.to_string(),
    });

    let state = Arc::new(AppState::new(config));
    state.bootstrap().unwrap();
    let router = HttpServer::build_router(state.clone()).unwrap();
    (state, router)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(router: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/v1/auth",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_user(router: &Router, admin_token: &str, username: &str, permissions: Value) {
    let (status, _) = send(
        router,
        Method::POST,
        "/api/v1/usercreate",
        Some(admin_token),
        Some(json!({
            "username": username,
            "password": "hunter2hunter2",
            "repeat-password": "hunter2hunter2",
            "permissions": permissions,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_session() {
    let (_, router) = setup();
    let (status, body) = send(&router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (_, router) = setup();
    let (status, body) = send(&router, Method::GET, "/api/v1/tasks", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Bad credentials");
}

#[tokio::test]
async fn test_wrong_password_is_401() {
    let (_, router) = setup();
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/auth",
        None,
        Some(json!({"username": ADMIN, "password": "nope"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_verify_logout() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, body) = send(&router, Method::GET, "/api/v1/verify-token", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], ADMIN);

    let (status, _) = send(&router, Method::POST, "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::GET, "/api/v1/verify-token", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test]
async fn test_user_create_denied_lists_missing_path() {
    let (_, router) = setup();
    let admin = login(&router, ADMIN, ADMIN_PASSWORD).await;
    create_user(&router, &admin, "viewer", json!({})).await;

    let viewer = login(&router, "viewer", "hunter2hunter2").await;
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/usercreate",
        Some(&viewer),
        Some(json!({
            "username": "other",
            "password": "hunter2hunter2",
            "repeat-password": "hunter2hunter2",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["missing"], json!(["cion.user.create"]));
}

#[tokio::test]
async fn test_service_create_with_environment_grant() {
    let (_, router) = setup();
    let admin = login(&router, ADMIN, ADMIN_PASSWORD).await;
    create_user(
        &router,
        &admin,
        "deployer",
        json!({"cion": {"environment": {"staging": ["service"]}}}),
    )
    .await;
    let deployer = login(&router, "deployer", "hunter2hunter2").await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/services",
        Some(&deployer),
        Some(json!({"service-name": "web", "environments": ["staging"], "image-name": "web"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/services",
        Some(&deployer),
        Some(json!({
            "service-name": "api",
            "environments": ["staging", "production"],
            "image-name": "api"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["missing"],
        json!(["cion.config.edit", "cion.environment.$environments.service"])
    );
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_task_listing_shape() {
    let (state, router) = setup();
    for i in 0..5 {
        state
            .records
            .insert(
                "tasks",
                json!({"id": format!("t{}", i), "time": i, "event": "new-image", "status": "done"}),
            )
            .unwrap();
    }
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/v1/tasks?pageStart=0&pageLength=2&sortIndex=time&reverseSort=true",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalLength"], 5);
    assert_eq!(body["rows"][0]["id"], "t4");
    assert_eq!(body["rows"][1]["id"], "t3");
}

#[tokio::test]
async fn test_bad_search_term_is_400() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/v1/tasks?searchTerm=event%3A%28a%20OR%20b",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad search term");
}

#[tokio::test]
async fn test_environment_create_then_list() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;
    let environment = json!({"name": "staging", "mode": "manual", "tag-match": "rc-.*"});

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/environments",
        Some(&token),
        Some(environment.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Environment created");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/environments",
        Some(&token),
        Some(environment),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&router, Method::GET, "/api/v1/environments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalLength"], 1);
    assert_eq!(body["rows"][0]["name"], "staging");
}

#[tokio::test]
async fn test_missing_webhook_is_404() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, _) = send(&router, Method::GET, "/api/v1/webhooks/nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let mut config = ServerConfig::default();
    config.max_body_bytes = 64;
    let (_, router) = setup_with(config);
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/usercreate",
        Some(&token),
        Some(json!({
            "username": "a".repeat(200),
            "password": "hunter2hunter2",
            "repeat-password": "hunter2hunter2",
            "permissions": {},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], 413);
}

// =============================================================================
// Documents and Services
// =============================================================================

#[tokio::test]
async fn test_documents_need_session() {
    let (_, router) = setup();

    let (status, _) = send(&router, Method::GET, "/api/v1/documents", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/api/v1/document/glob", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_document_save_get_and_list() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    for document in [
        json!({"name": "motd", "plaintext-editable": true, "document": "hello"}),
        json!({"name": "glob", "document": "^([^:]+)"}),
    ] {
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/documents",
            Some(&token),
            Some(document),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Successfully save document");
    }

    // Saving under an existing name replaces the document
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/documents",
        Some(&token),
        Some(json!({"name": "motd", "plaintext-editable": true, "document": "bye"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&router, Method::GET, "/api/v1/document/motd", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"], "bye");

    let (status, body) = send(&router, Method::GET, "/api/v1/documents", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "motd");

    let (status, _) = send(&router, Method::GET, "/api/v1/document/nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_document_without_name_is_422() {
    let (_, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/documents",
        Some(&token),
        Some(json!({"document": "orphan"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_service_overview() {
    let (state, router) = setup();
    let token = login(&router, ADMIN, ADMIN_PASSWORD).await;

    let (status, _) = send(&router, Method::GET, "/api/v1/service/web", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/services",
        Some(&token),
        Some(json!({"service-name": "web", "environments": ["prod", "staging"], "image-name": "web"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    state
        .records
        .insert(
            TASKS,
            json!({
                "id": "t1",
                "event": "update-service",
                "status": "done",
                "environment": "prod",
                "image-name": "web:2.0",
                "time": 100,
            }),
        )
        .unwrap();

    let (status, body) = send(&router, Method::GET, "/api/v1/service/web", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environments"]["prod"]["image-name"], "web:2.0");
    assert_eq!(body["environments"]["staging"]["image-name"], "NA");
    assert_eq!(body["images-deployed"], json!(["web:2.0"]));
}
