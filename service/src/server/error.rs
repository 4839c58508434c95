//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::{AppError, OrchestrationFailure, OrchestrationStage};

/// An error rendered as `{"success": false, "error": ...}` with a status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,

    /// Set for failed deploys
    pub stage: Option<OrchestrationStage>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stage: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not authenticated")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

/// Status code for an application error
pub fn status_of(error: &AppError) -> StatusCode {
    match error {
        AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::ClusterNotFound(_) => StatusCode::NOT_FOUND,
        AppError::ClusterNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(status_of(&error), error.to_string())
    }
}

/// A failed deploy is always a 500; the stage tells the caller what failed
impl From<OrchestrationFailure> for ApiError {
    fn from(failure: OrchestrationFailure) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: failure.error.to_string(),
            stage: Some(failure.stage),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.stage {
            Some(stage) => json!({
                "success": false,
                "stage": stage,
                "error": self.message,
            }),
            None => json!({
                "success": false,
                "error": self.message,
            }),
        };
        (self.status, Json(body)).into_response()
    }
}
