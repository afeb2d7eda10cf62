use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::models::BookingStatus;

/// Engine-level error taxonomy. Controllers map these onto HTTP statuses;
/// services never see a status code.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input. Rejected before any store call, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Normal business outcome (room taken, guard not satisfied), not a fault.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Store unreachable, write failed or timed out. Surfaced to the caller,
    /// who may resubmit; no automatic retry here.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Lifecycle guard violated. Carries both statuses for diagnostics.
    #[error("invalid transition: booking is {from}, cannot move to {attempted}")]
    InvalidTransition {
        from: BookingStatus,
        attempted: BookingStatus,
    },

    /// Missing or invalid staff credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Persistence(e.to_string())
    }
}

#[derive(Serialize)]
struct ApiError {
    success: bool,
    message: String,
}

impl IntoResponse for EngineError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) | EngineError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("engine error: {}", self);
        }

        let body = ApiError {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
