//! The boundary error taxonomy: everything that can go wrong talking to
//! the outside world, and how it maps onto an HTTP response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::intake::IntakeError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Processor(#[from] escrow_core::ProcessorError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            ServiceError::Intake(IntakeError::MalformedJson(_)) => {
                (StatusCode::BAD_REQUEST, "malformed json".to_string())
            }
            ServiceError::Intake(IntakeError::SignatureVerificationFailed) => (
                StatusCode::UNAUTHORIZED,
                "signature verification failed".to_string(),
            ),
            ServiceError::Processor(err) => {
                tracing::error!(error = %err, "processor error surfaced to HTTP boundary");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(serde_json::json!({"ok": false, "reason": reason}))).into_response()
    }
}
