use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

/// Canonical booking lifecycle. The legacy vocabulary collapsed
/// `in_progress` into `assigned`; there is no separate intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Assigned,
    AwaitingPassengerConfirmation,
    Ready,
    OnTheWay,
    OnTrip,
    Completed,
    Cancelled,
    Declined,
}

impl BookingStatus {
    /// Wire-format label, used in error messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Assigned => "assigned",
            BookingStatus::AwaitingPassengerConfirmation => "awaiting_passenger_confirmation",
            BookingStatus::Ready => "ready",
            BookingStatus::OnTheWay => "on_the_way",
            BookingStatus::OnTrip => "on_trip",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FareResponse {
    None,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Human-facing dispatch code, e.g. `JR-1001`. Secondary lookup key.
    pub code: String,
    pub passenger_id: Uuid,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub status: BookingStatus,
    pub driver_id: Option<Uuid>,
    pub proposed_fare: Option<f64>,
    pub verified_fare: Option<f64>,
    pub fare_response: FareResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
