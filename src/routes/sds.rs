//! SDS verification routes
//!
//! Endpoints:
//! - POST /verify-sds - Check whether a remote PDF looks like a Safety Data Sheet

use axum::{body::Bytes, extract::State, routing::post, Json, Router};

use crate::error::{AppError, Result};
use crate::sds::{VerifyRequest, VerifyResponse};
use crate::state::AppState;

/// Create the SDS router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(verify_sds))
}

/// POST /verify-sds
///
/// The body is read leniently: anything that is not a JSON object with
/// `url` and `name` is treated as an empty request.
async fn verify_sds(State(state): State<AppState>, body: Bytes) -> Result<Json<VerifyResponse>> {
    let request: VerifyRequest = serde_json::from_slice(&body).unwrap_or_default();

    let (url, name) = match (request.url, request.name) {
        (Some(url), Some(name)) if !url.is_empty() && !name.is_empty() => (url, name),
        _ => return Err(AppError::BadRequest("Missing url or name".to_string())),
    };

    tracing::info!(product = %name, "Verifying SDS document");

    match state.verifier().verify_within_deadline(url, name).await {
        Ok(outcome) => Ok(Json(VerifyResponse {
            verified: outcome.verified,
        })),
        Err(e) if e.is_timeout() => Err(AppError::Timeout(
            "Verification timeout - PDF too large or slow to process".to_string(),
        )),
        Err(e) => Err(AppError::Internal(format!("Verification failed: {}", e))),
    }
}
