use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{db::DbError, services::LookupError};

/// Every non-success outcome of the lookup endpoint.
///
/// The body is always `{ "error": <message> }`. Internal details are logged
/// where the error is created and never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Client ID is required")]
    MissingClientId,

    #[error("Invalid Client ID format")]
    InvalidClientId,

    #[error("Client not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Database error occurred")]
    Database,

    #[error("Failed to fetch data")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingClientId | ApiError::InvalidClientId => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Database | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => ApiError::NotFound,
            LookupError::Store(DbError::Sqlx(e)) => {
                tracing::error!(error = %e, "Database error during client lookup");
                ApiError::Database
            }
        }
    }
}
