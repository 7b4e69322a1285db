use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Not Found")]
    NotFound,

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i64 },

    #[error("Price mismatch for product {product_id}")]
    PriceMismatch { product_id: i64 },

    #[error("Service unavailable")]
    Unavailable(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            // Business-rule rejections inside the order transaction surface
            // as 400s; the transaction itself has already been rolled back.
            AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::PriceMismatch { .. } => StatusCode::BAD_REQUEST,
            AppError::Unavailable(err) => {
                tracing::error!(error = %err, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            message: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (
                AppError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AppError::Unauthorized("nope".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::Forbidden("expired".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (
                AppError::InsufficientStock { product_id: 1 },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::PriceMismatch { product_id: 1 },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn store_faults_stay_generic() {
        let err = AppError::Unavailable(sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "Service unavailable");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
