use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle;
use crate::models::audit::AuditEntry;
use crate::models::booking::{Booking, BookingStatus, FareResponse};
use crate::state::AppState;

/// Moves a booking along its lifecycle: driver progress (on_the_way,
/// on_trip, completed), cancellation, decline, or an operator reset to
/// pending. All moves are validated transitions committed under the
/// booking's map entry, so concurrent updates serialize and losers get a
/// conflict.
pub fn advance(
    state: &AppState,
    booking_id: Uuid,
    next: BookingStatus,
    driver_id: Option<Uuid>,
    actor: &str,
) -> Result<Booking, AppError> {
    // these states are only reachable through the assignment engine and the
    // fare cycle, which bind the driver, run the wallet guard and write the
    // audit trail; the generic status route must not skip them
    if matches!(
        next,
        BookingStatus::Assigned
            | BookingStatus::AwaitingPassengerConfirmation
            | BookingStatus::Ready
    ) {
        return Err(AppError::Validation(format!(
            "status {} can only be reached through assignment or fare confirmation",
            next.as_str()
        )));
    }

    let mut booking = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))?;

    // the assigned driver bowing out returns the booking to the pool
    // instead of killing it
    let driver_decline = next == BookingStatus::Declined
        && booking.driver_id.is_some()
        && driver_id == booking.driver_id;

    let effective = if driver_decline {
        BookingStatus::Pending
    } else {
        next
    };

    if !lifecycle::transition_allowed(booking.status, effective) {
        return Err(AppError::Conflict(format!(
            "booking {} cannot move from {} to {}",
            booking.code,
            booking.status.as_str(),
            effective.as_str()
        )));
    }

    if effective == BookingStatus::Pending {
        let previous = booking.driver_id.take();
        booking.proposed_fare = None;
        booking.verified_fare = None;
        booking.fare_response = FareResponse::None;
        booking.status = BookingStatus::Pending;
        booking.updated_at = Utc::now();

        if previous.is_some() {
            let (source, reason) = if driver_decline {
                ("driver_decline", "driver declined booking")
            } else {
                ("manual", "unassigned by operator")
            };
            state.record_audit(AuditEntry::new(
                booking.id, previous, None, actor, source, reason,
            ));
        }

        info!(booking = %booking.code, "booking returned to pool");
        return Ok(booking.clone());
    }

    booking.status = effective;
    booking.updated_at = Utc::now();

    if lifecycle::is_terminal(effective) {
        state.metrics.active_bookings.dec();
        if effective == BookingStatus::Cancelled && booking.driver_id.is_some() {
            state.record_audit(AuditEntry::new(
                booking.id,
                booking.driver_id,
                None,
                actor,
                "cancel",
                "booking cancelled",
            ));
        }
    }

    info!(booking = %booking.code, status = effective.as_str(), "booking status updated");
    Ok(booking.clone())
}
