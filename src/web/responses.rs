use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Plain `{ "message": .. }` payload.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "success": true }`
#[derive(Debug, Serialize, Clone, Copy)]
pub struct SuccessBody {
    pub success: bool,
}

impl SuccessBody {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Clone)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Canonical error exit for both handlers: `{ "error": .., "details"?: .. }`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    /// Opaque 500 for failures with no specific mapping.
    pub fn server_error(err: &anyhow::Error) -> Self {
        tracing::error!(?err, "unhandled error while processing request");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Server error".to_string(),
            details: Some(format!("{err:#}")),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::server_error(&err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Shorthand for `ApiError::new`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    ApiError::new(status, message)
}
