use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content cannot be empty")]
    EmptyContent,

    #[error("Content too large")]
    ContentTooLarge,

    #[error("Invalid syntax_type value")]
    InvalidSyntaxType,

    #[error("Invalid expires_in value")]
    InvalidExpiresIn,

    #[error("Paste not found")]
    NotFound,

    #[error("Paste has expired")]
    Expired,

    #[error("No unused keys available")]
    NoKeysAvailable,

    #[error("Duplicate short_id on insert")]
    Duplicate,

    #[error("Content not found")]
    ContentNotFound,

    #[error("Access denied")]
    AccessDenied,
}

impl AppError {
    /// Status and message for the plain-text arm of the short URL route.
    pub fn plain_parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound | AppError::ContentNotFound => {
                (StatusCode::NOT_FOUND, "Paste not found")
            }
            AppError::Expired => (StatusCode::GONE, "Paste has expired"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::EmptyContent => (StatusCode::BAD_REQUEST, "Content cannot be empty"),
            AppError::ContentTooLarge => {
                let body = Json(json!({ "error": "Content too large", "max_size": "1MB" }));
                return (StatusCode::PAYLOAD_TOO_LARGE, body).into_response();
            }
            AppError::InvalidSyntaxType => (StatusCode::BAD_REQUEST, "Invalid syntax_type value"),
            AppError::InvalidExpiresIn => (StatusCode::BAD_REQUEST, "Invalid expires_in value"),
            AppError::NotFound | AppError::ContentNotFound => {
                (StatusCode::NOT_FOUND, "Paste not found")
            }
            AppError::Expired => (StatusCode::GONE, "Paste has expired"),
            AppError::NoKeysAvailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            AppError::Duplicate => {
                // A collision here means a reserved key was handed out twice.
                tracing::error!("short_id collision on insert: key pool invariant breached");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            other => {
                tracing::error!("internal error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
