use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Reorder stopped at id {failed_id} after {applied} applied item(s): {source}")]
    Reorder {
        failed_id: i64,
        applied: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a `NotFound` for an entity kind and lookup key
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        AppError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "Conflict",
            AppError::NotAuthenticated(_) => "NotAuthenticated",
            AppError::Cancelled => "Cancelled",
            AppError::Reorder { .. } => "ReorderError",
            AppError::Storage(_) => "StorageError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotAuthenticated(_) => StatusCode::FORBIDDEN,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Reorder { source, .. } => source.status_code(),
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: self.error_type().to_string(),
                message: self.to_string(),
            },
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
