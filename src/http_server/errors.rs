//! HTTP error responses
//!
//! Every failure leaves the server as `{"error": <message>, "code": <status>}`;
//! permission denials add `"missing": [<path>, ...]`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::listing::{ListError, StorageError};
use crate::permissions::PermissionError;

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Malformed request body or parameters
    #[error("{0}")]
    BadRequest(String),

    /// Well-formed but rejected input
    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    NotFound(String),

    /// Request body larger than `max_body_bytes`
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::List(e) => e.status_code(),
            ApiError::Permission(e) => e.status_code(),
            ApiError::Storage(StorageError::CollectionNotFound(_)) => 404,
            ApiError::Storage(StorageError::DuplicateKey { .. }) => 422,
            ApiError::Storage(StorageError::InvalidRecord(_)) => 422,
            ApiError::Storage(StorageError::UnsortableField(_)) => 400,
            ApiError::Storage(StorageError::Unavailable(_)) => 500,
            ApiError::BadRequest(_) => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::NotFound(_) => 404,
            ApiError::PayloadTooLarge(_) => 413,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Decode a JSON request body
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let missing = match err {
            ApiError::Auth(AuthError::Forbidden { missing }) => Some(missing.clone()),
            _ => None,
        };
        Self {
            error: err.to_string(),
            code: err.status_code().as_u16(),
            missing,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ParseError, ParseErrorKind};

    #[test]
    fn test_bad_search_term_body() {
        let parse = ParseError::new(ParseErrorKind::UnexpectedEnd, 3);
        let err = ApiError::from(ListError::BadSearchTerm(parse.into()));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["error"], "Bad search term");
        assert!(body.get("missing").is_none());
    }

    #[test]
    fn test_forbidden_carries_missing() {
        let err = ApiError::from(AuthError::Forbidden {
            missing: vec!["cion.user.create".into()],
        });

        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["missing"], serde_json::json!(["cion.user.create"]));
        assert_eq!(body["code"], 403);
    }

    #[test]
    fn test_bad_credentials() {
        let err = ApiError::from(AuthError::SessionInvalid);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Bad credentials");
    }

    #[test]
    fn test_payload_too_large() {
        let err = ApiError::PayloadTooLarge("Request body exceeds 64 bytes".into());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["code"], 413);
    }
}
