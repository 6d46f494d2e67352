//! Error types for the local facilitator HTTP service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use t402::facilitator::FacilitatorError as CoreFacilitatorError;
use t402::proto::{AsPaymentProblem, ErrorReason};

/// Wraps [`CoreFacilitatorError`] so it can be returned directly from Axum handlers.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct FacilitatorError(#[from] CoreFacilitatorError);

impl IntoResponse for FacilitatorError {
    fn into_response(self) -> Response {
        let problem = self.0.as_payment_problem();
        let status = match problem.reason() {
            ErrorReason::UnsupportedScheme | ErrorReason::UnsupportedChain => StatusCode::NOT_FOUND,
            ErrorReason::UnexpectedError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({
            "reason": problem.reason().as_str(),
            "details": problem.details(),
        });
        (status, axum::Json(body)).into_response()
    }
}
