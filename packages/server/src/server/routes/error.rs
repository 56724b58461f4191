//! API error type with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domains::doses::IntakeError;
use crate::domains::regimens::RegimenError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<RegimenError> for ApiError {
    fn from(err: RegimenError) -> Self {
        match err {
            RegimenError::NotFound | RegimenError::PatientNotFound => {
                ApiError::NotFound(err.to_string())
            }
            RegimenError::InvalidSchedule(_)
            | RegimenError::MissingField(_)
            | RegimenError::NegativeQuantity => ApiError::BadRequest(err.to_string()),
            RegimenError::Store(e) => ApiError::Internal(format!("{:#}", e)),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::NotFound | IntakeError::PatientNotFound => {
                ApiError::NotFound(err.to_string())
            }
            IntakeError::Store(e) => ApiError::Internal(format!("{:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::regimens::ScheduleError;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let status = |e: ApiError| e.into_response().status();

        assert_eq!(status(RegimenError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RegimenError::InvalidSchedule(ScheduleError::NoDoseTimes).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(IntakeError::Store(anyhow::anyhow!("db down")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
