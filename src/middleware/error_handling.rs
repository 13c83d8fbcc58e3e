use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::error::AppError;

/// Uniform JSON error body for every failure path.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
    /// Underlying cause; populated for upstream failures, never shown as
    /// the top-level message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn map_error(err: &AppError) -> (StatusCode, ErrorBody) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error_type, code) = match err {
        AppError::Validation(_) => ("validation_error", "INVALID_REQUEST"),
        AppError::SignatureInvalid(_) => ("validation_error", "SIGNATURE_INVALID"),
        AppError::NotFound(_) => ("not_found_error", "NOT_FOUND"),
        AppError::InvalidTransition { .. } => ("conflict_error", "ILLEGAL_TRANSITION"),
        AppError::Provider(_) => ("upstream_error", "PROVIDER_ERROR"),
        AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => {
            ("server_error", "INTERNAL_SERVER_ERROR")
        }
    };

    // Upstream/internal detail goes into `detail`, not the user-facing message
    let (message, detail) = match err {
        AppError::Database(_) => ("internal server error".to_string(), Some(err.to_string())),
        AppError::Provider(_) => (
            "upstream provider error".to_string(),
            Some(err.to_string()),
        ),
        AppError::Config(_) | AppError::StartServer(_) => {
            ("internal server error".to_string(), Some(err.to_string()))
        }
        _ => (err.to_string(), None),
    };

    let body = ErrorBody {
        error: match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::CONFLICT => "Conflict",
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
        .to_string(),
        message,
        status: status.as_u16(),
        error_type: error_type.to_string(),
        code: code.to_string(),
        detail,
    };

    (status, body)
}

pub fn into_response(err: AppError) -> impl IntoResponse {
    let (status, body) = map_error(&err);
    (status, Json(body))
}
