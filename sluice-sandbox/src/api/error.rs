//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::pipeline_service::PipelineError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(msg) => ApiError::NotFound(msg),
            PipelineError::ValidationError(msg) => ApiError::BadRequest(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
