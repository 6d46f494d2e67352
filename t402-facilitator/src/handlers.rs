//! Axum route handlers for the local facilitator service.
//!
//! Provides REST endpoints for verify, settle, and supported operations.
//! Corresponds to the facilitator HTTP API defined by the x402 protocol.
//!
//! `/verify` and `/settle` accept both v1 and v2 payloads — [`t402::proto::VerifyRequest`]
//! and [`t402::proto::SettleRequest`] are thin JSON wrappers that dispatch to the right
//! scheme handler based on the `t402Version` field in the body, so there's no need for
//! separate versioned routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use t402::facilitator::Facilitator;
use t402::proto::{SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse};

use crate::error::FacilitatorError;

/// Shared application state for the facilitator service.
pub type FacilitatorState = Arc<dyn Facilitator>;

/// `GET /supported` — Returns the list of supported payment kinds.
///
/// # Errors
///
/// Returns 500 if any registered scheme handler fails unexpectedly.
pub async fn get_supported(
    State(fac): State<FacilitatorState>,
) -> Result<Json<SupportedResponse>, FacilitatorError> {
    let result = fac.supported().await?;
    Ok(Json(result))
}

/// `POST /verify` — Verifies a payment payload (v1 or v2).
///
/// # Errors
///
/// Returns 404 if no scheme handler is registered for the chain/scheme pair,
/// or 400 on a malformed or invalid payment.
pub async fn post_verify(
    State(fac): State<FacilitatorState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<VerifyResponse>, FacilitatorError> {
    let result = fac.verify(VerifyRequest::from(body)).await?;
    Ok(Json(result))
}

/// `POST /settle` — Settles a payment on-chain (v1 or v2).
///
/// # Errors
///
/// Returns 404 if no scheme handler is registered for the chain/scheme pair,
/// or 400 on a malformed or invalid payment.
pub async fn post_settle(
    State(fac): State<FacilitatorState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SettleResponse>, FacilitatorError> {
    let result = fac.settle(SettleRequest::from(body)).await?;
    Ok(Json(result))
}

/// Creates an Axum [`axum::Router`] with all facilitator endpoints.
///
/// Endpoints:
/// - `GET /supported` — list supported payment kinds
/// - `POST /verify` — verify a payment (v1 or v2)
/// - `POST /settle` — settle a payment (v1 or v2)
#[must_use]
pub fn facilitator_router(state: FacilitatorState) -> axum::Router {
    axum::Router::new()
        .route("/supported", axum::routing::get(get_supported))
        .route("/verify", axum::routing::post(post_verify))
        .route("/settle", axum::routing::post(post_settle))
        .with_state(state)
}
