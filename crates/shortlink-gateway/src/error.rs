use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shortlink_core::ServiceError;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Service(err) => match err {
                ServiceError::InvalidUrl | ServiceError::InvalidScheme => {
                    (StatusCode::BAD_REQUEST, "invalid URL".to_string())
                }
                ServiceError::AliasExists(_) => {
                    (StatusCode::CONFLICT, "alias already exists".to_string())
                }
                ServiceError::UrlNotFound => (StatusCode::NOT_FOUND, "alias not found".to_string()),
                ServiceError::PermissionDenied => (
                    StatusCode::FORBIDDEN,
                    "you do not have permission to delete this URL".to_string(),
                ),
                ServiceError::InvalidStoredUrl(_) => {
                    (StatusCode::BAD_REQUEST, "invalid redirect URL".to_string())
                }
                ServiceError::AliasGenerationFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to generate alias".to_string(),
                ),
                ServiceError::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                ),
            },
            AppError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, format!("unauthorized: {err}")),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            // The detailed cause stays in the logs.
            error!(error = %self, status = status.as_u16(), "request failed");
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
