use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::progress;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus, FareResponse};
use crate::models::driver::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/status", post(update_status))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub passenger_id: Uuid,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    pub driver_id: Option<Uuid>,
    pub actor: Option<String>,
}

fn validate_point(point: &GeoPoint, field: &str) -> Result<(), AppError> {
    let in_range =
        (-90.0..=90.0).contains(&point.lat) && (-180.0..=180.0).contains(&point.lng);
    if !in_range {
        return Err(AppError::Validation(format!(
            "{field} coordinates out of range"
        )));
    }
    Ok(())
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    validate_point(&payload.pickup, "pickup")?;
    validate_point(&payload.dropoff, "dropoff")?;

    let booking = Booking {
        id: Uuid::new_v4(),
        code: state.next_booking_code(),
        passenger_id: payload.passenger_id,
        pickup: payload.pickup,
        dropoff: payload.dropoff,
        status: BookingStatus::Pending,
        driver_id: None,
        proposed_fare: None,
        verified_fare: None,
        fare_response: FareResponse::None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    state.booking_codes.insert(booking.code.clone(), booking.id);
    state.bookings.insert(booking.id, booking.clone());
    state.metrics.active_bookings.inc();

    info!(booking = %booking.code, passenger_id = %booking.passenger_id, "booking created");
    Ok(Json(booking))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::BookingNotFound(id.to_string()))?;

    Ok(Json(booking.value().clone()))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = payload.actor.as_deref().unwrap_or("ops");
    let booking = progress::advance(&state, id, payload.status, payload.driver_id, actor)?;
    Ok(Json(booking))
}
