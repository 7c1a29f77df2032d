use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api;

/// Everything a handler can fail with, mapped onto the wire in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("ValidationError: {0}")]
    Validation(String),
    #[error("NotFoundError: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bookmark_not_found() -> Self {
        ApiError::NotFound("Bookmark Not Found".to_string())
    }

    pub fn list_not_found() -> Self {
        ApiError::NotFound("List Not Found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                tracing::info!("validation failed: {}", message);
                api::bad_request(&message)
            }
            ApiError::NotFound(message) => api::not_found(&message),
            ApiError::Store(e) => {
                // Full chain goes to the log; the client gets a generic body.
                tracing::error!("store error: {:#}", e);
                api::server_error("server error")
            }
        }
    }
}
