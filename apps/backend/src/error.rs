//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use forge_core::{CollaboratorError, WorkflowError};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Service error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Workflow(err) => match err {
                WorkflowError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
                WorkflowError::Incomplete(_) => (StatusCode::CONFLICT, "incomplete"),
                WorkflowError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
                WorkflowError::Resolution(_) => (StatusCode::BAD_GATEWAY, "resolution_failed"),
                WorkflowError::Collaborator(_) => (StatusCode::BAD_GATEWAY, "service_error"),
                WorkflowError::Export(_) => (StatusCode::BAD_GATEWAY, "export_failed"),
            },
            ApiError::Collaborator(_) => (StatusCode::BAD_GATEWAY, "service_error"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
