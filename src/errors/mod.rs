//! Error handling module for the pantry planner backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and the
//! JSON error envelope.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const CONFLICT: &str = "CONFLICT";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const AI_UNAVAILABLE: &str = "AI_UNAVAILABLE";
    pub const AI_ERROR: &str = "AI_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Message returned for every 5xx response. Details only go to the log.
const GENERIC_SERVER_MESSAGE: &str = "Internal server error";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No valid session
    Unauthorized,
    /// Resource belongs to another user
    Forbidden(String),
    /// Resource not found
    NotFound(String),
    /// Request body failed validation
    Validation(String),
    /// Operation not allowed in the resource's current lifecycle state
    InvalidState(String),
    /// Uniqueness violation or repeated one-shot operation
    Conflict(String),
    /// Malformed request
    BadRequest(String),
    /// An AI feature was requested but no LLM is configured
    AiUnavailable,
    /// The LLM call failed or returned something unusable
    Ai(String),
    /// Database error
    Database(String),
    /// Search index error
    Search(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Ai(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::InvalidState(_) => codes::INVALID_STATE,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::AiUnavailable => codes::AI_UNAVAILABLE,
            AppError::Ai(_) => codes::AI_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Search(_) => codes::SEARCH_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the message shown to the client.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidState(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::AiUnavailable => "AI assistant is not configured".to_string(),
            AppError::Ai(msg) => msg.clone(),
            AppError::Database(_) | AppError::Search(_) | AppError::Internal(_) => {
                GENERIC_SERVER_MESSAGE.to_string()
            }
        }
    }

    /// Shorthand for a 403 on a resource of another user.
    pub fn forbidden(resource: &str) -> Self {
        AppError::Forbidden(format!("You do not have access to this {}", resource))
    }

    /// Shorthand for a 404 on a resource id.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} {} not found", resource, id))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(detail) | AppError::Search(detail) | AppError::Internal(detail) => {
                write!(f, "{}: {}", self.error_code(), detail)
            }
            _ => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!("Search error: {:?}", err);
        AppError::Search(format!("Search error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("LLM request error: {:?}", err);
        AppError::Ai("AI assistant request failed".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::Validation(rejection.body_text())
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.message(),
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self);
        }
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database("no such table: secrets".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal server error");
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_unauthorized_body() {
        let body = ErrorResponse::new(&AppError::Unauthorized);
        assert_eq!(body.error, "Unauthorized");
        assert_eq!(body.code, codes::UNAUTHORIZED);
        assert!(!body.success);
    }

    #[test]
    fn test_state_errors_are_conflicts() {
        let err = AppError::InvalidState("List is archived".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "INVALID_STATE");
    }
}
