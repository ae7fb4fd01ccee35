use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("Database unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Wisdom not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ApiError {
    /// Classifies an error coming out of the repository layer
    ///
    /// Failing to get a connection from the pool means the store is unreachable,
    /// which callers may retry later. Everything else is a plain database error.
    pub fn from_repo(err: anyhow::Error) -> Self {
        if let Some(pool_err) = err.downcast_ref::<diesel::r2d2::PoolError>() {
            return ApiError::StoreUnavailable(pool_err.to_string());
        }
        ApiError::Database(err)
    }
}

// Extractor rejections answer with the same JSON envelope as handler errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<axum_extra::extract::QueryRejection> for ApiError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!("Database error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::StoreUnavailable(msg) => {
                error!("Store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable".to_string())
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Wisdom not found".to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
