use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::domain::checkout::CheckoutError;
use crate::domain::refund::RefundError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Recoverable cashier-facing conditions. Messages are in Indonesian and
    // shown verbatim on the POS screen.
    #[error("{0}")]
    InsufficientStock(String),

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    InsufficientPoints(String),

    #[error("{0}")]
    AlreadyCancelled(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientStock(_)
            | AppError::InsufficientBalance(_)
            | AppError::InsufficientPoints(_)
            | AppError::AlreadyCancelled(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match &err {
            CheckoutError::InsufficientStock { .. } => AppError::InsufficientStock(err.to_string()),
            CheckoutError::InsufficientBalance { .. } => {
                AppError::InsufficientBalance(err.to_string())
            }
            CheckoutError::InsufficientPoints { .. } => {
                AppError::InsufficientPoints(err.to_string())
            }
            CheckoutError::EmptyCart
            | CheckoutError::InvalidQuantity { .. }
            | CheckoutError::UnknownProduct(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<RefundError> for AppError {
    fn from(err: RefundError) -> Self {
        match &err {
            RefundError::AlreadyCancelled(_) => AppError::AlreadyCancelled(err.to_string()),
            RefundError::CorruptSnapshot(_) => AppError::Internal(err.to_string()),
        }
    }
}
