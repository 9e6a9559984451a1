use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::engine::fare;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fare/propose", post(propose_fare))
        .route("/fare/accept", post(accept_fare))
        .route("/fare/reject", post(reject_fare))
}

#[derive(Deserialize)]
pub struct ProposeFareRequest {
    pub booking_code: String,
    pub fare: f64,
}

/// Passenger identity arrives in the body; session handling is an external
/// collaborator and ownership is still enforced against the booking.
#[derive(Deserialize)]
pub struct FareResponseRequest {
    pub booking_id: Uuid,
    pub passenger_id: Uuid,
}

async fn propose_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProposeFareRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = fare::propose(&state, &payload.booking_code, payload.fare)?;
    Ok(Json(json!({ "ok": true, "booking": booking })))
}

async fn accept_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FareResponseRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = fare::accept(&state, payload.booking_id, payload.passenger_id)?;
    Ok(Json(json!({ "ok": true, "booking": booking })))
}

async fn reject_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FareResponseRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = fare::reject(&state, payload.booking_id, payload.passenger_id)?;
    Ok(Json(json!({ "ok": true, "booking": booking })))
}
