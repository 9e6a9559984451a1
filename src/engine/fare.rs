use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle;
use crate::models::audit::AuditEntry;
use crate::models::booking::{Booking, BookingStatus, FareResponse};
use crate::state::AppState;

/// Driver proposes a fare. Legal only while the booking is pending or
/// assigned; moves it to awaiting passenger confirmation.
pub fn propose(state: &AppState, booking_code: &str, fare: f64) -> Result<Booking, AppError> {
    if !fare.is_finite() || fare <= 0.0 {
        return Err(AppError::Validation(
            "fare must be a positive amount".to_string(),
        ));
    }

    let id = state
        .resolve_booking(None, Some(booking_code))
        .ok_or_else(|| AppError::BookingNotFound(booking_code.to_string()))?;

    let mut booking = state
        .bookings
        .get_mut(&id)
        .ok_or_else(|| AppError::BookingNotFound(booking_code.to_string()))?;

    if !lifecycle::transition_allowed(
        booking.status,
        BookingStatus::AwaitingPassengerConfirmation,
    ) {
        return Err(AppError::Conflict(format!(
            "fare can only be proposed while pending or assigned, booking {} is {}",
            booking.code,
            booking.status.as_str()
        )));
    }

    booking.proposed_fare = Some(fare);
    booking.fare_response = FareResponse::None;
    booking.status = BookingStatus::AwaitingPassengerConfirmation;
    booking.updated_at = Utc::now();

    info!(booking = %booking.code, fare, "fare proposed");
    Ok(booking.clone())
}

/// Owning passenger accepts the proposed fare. Locks in the verified fare
/// and moves the booking to ready.
pub fn accept(state: &AppState, booking_id: Uuid, passenger_id: Uuid) -> Result<Booking, AppError> {
    let mut booking = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))?;

    if booking.passenger_id != passenger_id {
        return Err(AppError::Forbidden(format!(
            "passenger {passenger_id} does not own booking {}",
            booking.code
        )));
    }

    if !lifecycle::transition_allowed(booking.status, BookingStatus::Ready) {
        return Err(AppError::Conflict(format!(
            "booking {} is {}, no fare awaiting confirmation",
            booking.code,
            booking.status.as_str()
        )));
    }

    let proposed = booking.proposed_fare.ok_or_else(|| {
        AppError::Conflict(format!("booking {} has no proposed fare", booking.code))
    })?;

    if booking.verified_fare.is_none() {
        booking.verified_fare = Some(proposed);
    }
    booking.fare_response = FareResponse::Accepted;
    booking.status = BookingStatus::Ready;
    booking.updated_at = Utc::now();

    info!(booking = %booking.code, fare = proposed, "fare accepted");
    Ok(booking.clone())
}

/// Owning passenger rejects the proposed fare. Resets the booking to
/// pending with driver and fare fields cleared, so it can be dispatched to
/// a different driver. Clearing the driver is an unassignment and is
/// audited as such.
pub fn reject(state: &AppState, booking_id: Uuid, passenger_id: Uuid) -> Result<Booking, AppError> {
    let mut booking = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))?;

    if booking.passenger_id != passenger_id {
        return Err(AppError::Forbidden(format!(
            "passenger {passenger_id} does not own booking {}",
            booking.code
        )));
    }

    if booking.status != BookingStatus::Pending
        && !lifecycle::transition_allowed(booking.status, BookingStatus::Pending)
    {
        return Err(AppError::Conflict(format!(
            "booking {} is {}, fare can no longer be rejected",
            booking.code,
            booking.status.as_str()
        )));
    }

    let previous_driver = booking.driver_id.take();
    booking.proposed_fare = None;
    booking.verified_fare = None;
    booking.fare_response = FareResponse::Rejected;
    booking.status = BookingStatus::Pending;
    booking.updated_at = Utc::now();

    if previous_driver.is_some() {
        state.record_audit(AuditEntry::new(
            booking.id,
            previous_driver,
            None,
            &passenger_id.to_string(),
            "fare_reject",
            "fare rejected by passenger",
        ));
    }

    info!(booking = %booking.code, "fare rejected, booking returned to pool");
    Ok(booking.clone())
}
