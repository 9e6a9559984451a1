use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("booking {0} not found")]
    BookingNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyAssigned(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    WalletBlocked(String),

    #[error("{0}")]
    NoEligibleDriver(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code surfaced alongside the message. Callers
    /// branch on this, never on the message text.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyAssigned(_) => "ALREADY_ASSIGNED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::WalletBlocked(_) => "WALLET_BLOCKED",
            AppError::NoEligibleDriver(_) => "NO_ELIGIBLE_DRIVER",
            AppError::Config(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::WalletBlocked(_) => StatusCode::BAD_REQUEST,
            AppError::BookingNotFound(_)
            | AppError::NotFound(_)
            | AppError::NoEligibleDriver(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyAssigned(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}
