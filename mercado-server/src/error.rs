//! Service-layer error bridge
//!
//! Handlers return [`ServiceError`] so `?` works on both sqlx calls and
//! domain errors without per-call `map_err` boilerplate. Database errors
//! are logged here and surfaced as an opaque 500.

use axum::response::{IntoResponse, Response};
use shared::error::{ApiResponse, AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    App(#[from] AppError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Db(e) => {
                tracing::error!(error = %e, "Ledger store query failed");
                AppError::new(ErrorCode::DatabaseError).into_response()
            }
            Self::App(e) => e.into_response(),
        }
    }
}

/// Result type for API handlers: a response envelope or a service error
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_passthrough() {
        let err: ServiceError = AppError::new(ErrorCode::OrderNotFound).into();
        assert!(matches!(err, ServiceError::App(ref e) if e.code == ErrorCode::OrderNotFound));
    }

    #[test]
    fn test_db_error_conversion() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
