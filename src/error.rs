use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::middleware::error_handling;
use crate::models::room::RoomStatus;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_handling::into_response(self).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition { from: RoomStatus, to: RoomStatus },

    #[error("webhook signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("streaming provider error: {0}")]
    Provider(String),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Transient failures that a caller may retry (pool exhaustion, I/O,
    /// upstream provider hiccups). Validation and not-found are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            AppError::Provider(_) | AppError::Internal => true,
            _ => false,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::SignatureInvalid(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::InvalidTransition { .. } => 409,
            AppError::Provider(_) => 502,
            AppError::Config(_)
            | AppError::StartServer(_)
            | AppError::Database(_)
            | AppError::Internal => 500,
        }
    }
}
