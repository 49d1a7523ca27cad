use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any failure coming out of the persistence layer.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),
}

impl RepoError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RepoError::Database(e) => e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false),
            RepoError::Timeout(_) => false,
        }
    }
}

/// Error body: `{"data": {"status": "...", "description": "...", "code": "..."}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseData {
    pub data: ErrorResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub description: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub description: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, description: impl Into<String>) -> Self {
        Self {
            status,
            code,
            description: description.into(),
        }
    }

    pub fn bad_request(code: &'static str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, description)
    }

    pub fn not_found(code: &'static str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, description)
    }

    pub fn conflict(code: &'static str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, description)
    }

    pub fn internal(code: &'static str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, description)
    }

    pub fn binding() -> Self {
        Self::bad_request("request_binding_error", "Unable to bind request")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponseData {
            data: ErrorResponse {
                status: self.status.as_u16().to_string(),
                description: self.description,
                code: self.code.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}
