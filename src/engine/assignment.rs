use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::wallet;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::lifecycle;
use crate::models::audit::AuditEntry;
use crate::models::booking::{Booking, BookingStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    Manual,
    AutoNearest,
    Rebalance,
}

impl AssignmentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentMode::Manual => "manual",
            AssignmentMode::AutoNearest => "auto_nearest",
            AssignmentMode::Rebalance => "rebalance",
        }
    }
}

/// Binds a driver to a pending booking.
///
/// The booking's map entry is held from the status check through the commit,
/// so two concurrent attempts on the same booking serialize: the first
/// writer wins, the second observes `assigned` and gets `ALREADY_ASSIGNED`.
/// The chosen driver's entry is acquired second (lock order is always
/// booking, then driver) and held across the wallet check and the commit,
/// closing the check/use gap on the balance.
///
/// Every attempt on a resolvable booking appends an audit entry, failures
/// included, carrying the error code as the reason.
pub fn assign(
    state: &AppState,
    booking_id: Option<Uuid>,
    booking_code: Option<&str>,
    driver_id: Option<Uuid>,
    mode: AssignmentMode,
    actor: &str,
) -> Result<Booking, AppError> {
    let label = booking_code
        .map(str::to_string)
        .or_else(|| booking_id.map(|id| id.to_string()))
        .ok_or_else(|| {
            AppError::Validation("either booking_id or booking_code is required".to_string())
        })?;

    let id = state
        .resolve_booking(booking_id, booking_code)
        .ok_or_else(|| {
            warn!(booking = %label, "assignment attempt on unknown booking");
            AppError::BookingNotFound(label.clone())
        })?;

    let mut booking = state
        .bookings
        .get_mut(&id)
        .ok_or_else(|| AppError::BookingNotFound(label))?;

    if !lifecycle::transition_allowed(booking.status, BookingStatus::Assigned) {
        let err = AppError::AlreadyAssigned(format!(
            "booking {} is {}, expected pending",
            booking.code,
            booking.status.as_str()
        ));
        record_failure(state, &booking, driver_id, actor, mode, err.code());
        return Err(err);
    }

    match mode {
        AssignmentMode::Manual | AssignmentMode::Rebalance => {
            let driver_id = driver_id.ok_or_else(|| {
                AppError::Validation(format!(
                    "driver_id is required for {} assignment",
                    mode.as_str()
                ))
            })?;

            let driver = state.drivers.get(&driver_id).ok_or_else(|| {
                let err = AppError::NotFound(format!("driver {driver_id} not found"));
                record_failure(state, &booking, Some(driver_id), actor, mode, err.code());
                err
            })?;

            if let Err(reason) = wallet::check(&driver) {
                let err = AppError::WalletBlocked(format!("driver {driver_id}: {reason}"));
                record_failure(state, &booking, Some(driver_id), actor, mode, err.code());
                return Err(err);
            }

            Ok(commit(state, &mut booking, driver_id, mode, actor))
        }
        AssignmentMode::AutoNearest => {
            let now = Utc::now();
            let mut candidates: Vec<(Uuid, f64, DateTime<Utc>)> = state
                .drivers
                .iter()
                .filter_map(|entry| {
                    let driver = entry.value();
                    if !driver.online || wallet::check(driver).is_err() {
                        return None;
                    }

                    let age = now
                        .signed_duration_since(driver.location_updated_at)
                        .num_seconds();
                    if age > state.settings.location_freshness_secs {
                        return None;
                    }

                    let distance = haversine_km(&driver.location, &booking.pickup);
                    if distance > state.settings.search_radius_km {
                        return None;
                    }

                    Some((driver.id, distance, driver.location_updated_at))
                })
                .collect();

            // nearest first, ties broken by the freshest location
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.2.cmp(&a.2)));

            for (candidate_id, distance, _) in candidates {
                let Some(driver) = state.drivers.get(&candidate_id) else {
                    continue;
                };
                // re-checked under the entry guard; the scan result may be stale
                if wallet::check(&driver).is_err() {
                    continue;
                }

                info!(
                    booking = %booking.code,
                    driver_id = %candidate_id,
                    distance_km = distance,
                    "nearest driver selected"
                );
                return Ok(commit(state, &mut booking, candidate_id, mode, actor));
            }

            let err = AppError::NoEligibleDriver(format!(
                "no online driver within {:.1} km of pickup with a location newer than {} s",
                state.settings.search_radius_km, state.settings.location_freshness_secs
            ));
            record_failure(state, &booking, None, actor, mode, err.code());
            Err(err)
        }
    }
}

fn commit(
    state: &AppState,
    booking: &mut Booking,
    driver_id: Uuid,
    mode: AssignmentMode,
    actor: &str,
) -> Booking {
    let previous = booking.driver_id;
    booking.status = BookingStatus::Assigned;
    booking.driver_id = Some(driver_id);
    booking.updated_at = Utc::now();

    state.record_audit(AuditEntry::new(
        booking.id,
        previous,
        Some(driver_id),
        actor,
        mode.as_str(),
        "assigned",
    ));

    info!(
        booking = %booking.code,
        driver_id = %driver_id,
        mode = mode.as_str(),
        "driver assigned"
    );

    booking.clone()
}

fn record_failure(
    state: &AppState,
    booking: &Booking,
    attempted_driver: Option<Uuid>,
    actor: &str,
    mode: AssignmentMode,
    code: &str,
) {
    state.record_audit(AuditEntry::new(
        booking.id,
        booking.driver_id,
        attempted_driver,
        actor,
        mode.as_str(),
        code,
    ));

    warn!(
        booking = %booking.code,
        mode = mode.as_str(),
        code,
        "assignment attempt failed"
    );
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{AssignmentMode, assign};
    use crate::config::DispatchSettings;
    use crate::error::AppError;
    use crate::models::booking::{Booking, BookingStatus, FareResponse};
    use crate::models::driver::{Driver, GeoPoint};
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::new(DispatchSettings::default(), 16)
    }

    fn seed_booking(state: &AppState, lat: f64, lng: f64) -> Uuid {
        let id = Uuid::new_v4();
        let code = state.next_booking_code();
        let booking = Booking {
            id,
            code: code.clone(),
            passenger_id: Uuid::new_v4(),
            pickup: GeoPoint { lat, lng },
            dropoff: GeoPoint {
                lat: lat + 0.02,
                lng: lng + 0.02,
            },
            status: BookingStatus::Pending,
            driver_id: None,
            proposed_fare: None,
            verified_fare: None,
            fare_response: FareResponse::None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.bookings.insert(id, booking);
        state.booking_codes.insert(code, id);
        id
    }

    fn seed_driver(state: &AppState, lat: f64, lng: f64, stale_secs: i64) -> Uuid {
        let id = Uuid::new_v4();
        state.drivers.insert(
            id,
            Driver {
                id,
                name: format!("driver-{id}"),
                online: true,
                location: GeoPoint { lat, lng },
                location_updated_at: Utc::now() - Duration::seconds(stale_secs),
                wallet_balance: 200.0,
                min_required_balance: 50.0,
                wallet_locked: false,
                zone: "centro".to_string(),
            },
        );
        id
    }

    #[test]
    fn manual_assignment_binds_driver_and_audits() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        let driver_id = seed_driver(&state, 14.60, 120.98, 0);

        let booking = assign(
            &state,
            Some(booking_id),
            None,
            Some(driver_id),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Assigned);
        assert_eq!(booking.driver_id, Some(driver_id));

        let trail = state.audit_log.get(&booking_id).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].to_driver, Some(driver_id));
        assert_eq!(trail[0].reason, "assigned");
    }

    #[test]
    fn second_assignment_conflicts_and_is_audited() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        let first = seed_driver(&state, 14.60, 120.98, 0);
        let second = seed_driver(&state, 14.61, 120.99, 0);

        assign(
            &state,
            Some(booking_id),
            None,
            Some(first),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap();

        let err = assign(
            &state,
            Some(booking_id),
            None,
            Some(second),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::AlreadyAssigned(_)));

        let booking = state.bookings.get(&booking_id).unwrap();
        assert_eq!(booking.driver_id, Some(first));

        let trail = state.audit_log.get(&booking_id).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1].reason, "ALREADY_ASSIGNED");
    }

    #[test]
    fn concurrent_assignments_have_exactly_one_winner() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        let driver_a = seed_driver(&state, 14.60, 120.98, 0);
        let driver_b = seed_driver(&state, 14.61, 120.99, 0);

        let (res_a, res_b) = std::thread::scope(|scope| {
            let a = scope.spawn(|| {
                assign(
                    &state,
                    Some(booking_id),
                    None,
                    Some(driver_a),
                    AssignmentMode::Manual,
                    "dispatcher-a",
                )
            });
            let b = scope.spawn(|| {
                assign(
                    &state,
                    Some(booking_id),
                    None,
                    Some(driver_b),
                    AssignmentMode::Manual,
                    "dispatcher-b",
                )
            });
            (a.join().unwrap(), b.join().unwrap())
        });

        let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let loser = if res_a.is_ok() { res_b } else { res_a };
        assert!(matches!(loser, Err(AppError::AlreadyAssigned(_))));

        let winner_driver = state.bookings.get(&booking_id).unwrap().driver_id;
        assert!(winner_driver == Some(driver_a) || winner_driver == Some(driver_b));
    }

    #[test]
    fn wallet_blocked_driver_is_rejected_and_booking_stays_pending() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        let driver_id = seed_driver(&state, 14.60, 120.98, 0);
        state.drivers.get_mut(&driver_id).unwrap().wallet_balance = 10.0;

        let err = assign(
            &state,
            Some(booking_id),
            None,
            Some(driver_id),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::WalletBlocked(_)));

        let booking = state.bookings.get(&booking_id).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.driver_id.is_none());

        let trail = state.audit_log.get(&booking_id).unwrap();
        assert_eq!(trail[0].reason, "WALLET_BLOCKED");
    }

    #[test]
    fn auto_nearest_picks_closest_fresh_driver() {
        let state = state();
        let booking_id = seed_booking(&state, 14.5995, 120.9842);
        let near = seed_driver(&state, 14.6010, 120.9850, 0);
        let _far = seed_driver(&state, 14.6500, 121.0300, 0);
        // closest of all, but the location is two hours old
        let _stale = seed_driver(&state, 14.5996, 120.9843, 7200);

        let booking = assign(
            &state,
            Some(booking_id),
            None,
            None,
            AssignmentMode::AutoNearest,
            "system",
        )
        .unwrap();

        assert_eq!(booking.driver_id, Some(near));
    }

    #[test]
    fn auto_nearest_ties_broken_by_freshest_location() {
        let state = state();
        let booking_id = seed_booking(&state, 14.5995, 120.9842);
        let _older = seed_driver(&state, 14.6010, 120.9850, 300);
        let fresher = seed_driver(&state, 14.6010, 120.9850, 5);

        let booking = assign(
            &state,
            Some(booking_id),
            None,
            None,
            AssignmentMode::AutoNearest,
            "system",
        )
        .unwrap();

        assert_eq!(booking.driver_id, Some(fresher));
    }

    #[test]
    fn auto_nearest_skips_offline_and_wallet_blocked() {
        let state = state();
        let booking_id = seed_booking(&state, 14.5995, 120.9842);
        let offline = seed_driver(&state, 14.5996, 120.9843, 0);
        state.drivers.get_mut(&offline).unwrap().online = false;
        let blocked = seed_driver(&state, 14.5997, 120.9844, 0);
        state.drivers.get_mut(&blocked).unwrap().wallet_locked = true;
        let eligible = seed_driver(&state, 14.6100, 120.9900, 0);

        let booking = assign(
            &state,
            Some(booking_id),
            None,
            None,
            AssignmentMode::AutoNearest,
            "system",
        )
        .unwrap();

        assert_eq!(booking.driver_id, Some(eligible));
    }

    #[test]
    fn auto_nearest_with_no_candidates_fails_and_audits() {
        let state = state();
        let booking_id = seed_booking(&state, 14.5995, 120.9842);
        // outside the default 10 km radius
        let _remote = seed_driver(&state, 15.5, 121.9, 0);

        let err = assign(
            &state,
            Some(booking_id),
            None,
            None,
            AssignmentMode::AutoNearest,
            "system",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NoEligibleDriver(_)));

        let booking = state.bookings.get(&booking_id).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let trail = state.audit_log.get(&booking_id).unwrap();
        assert_eq!(trail[0].reason, "NO_ELIGIBLE_DRIVER");
    }

    #[test]
    fn rebalance_assignment_is_audited_under_its_own_source() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        // driver parked well outside the auto-search radius
        let driver_id = seed_driver(&state, 15.50, 121.90, 0);

        let booking = assign(
            &state,
            Some(booking_id),
            None,
            Some(driver_id),
            AssignmentMode::Rebalance,
            "dispatcher",
        )
        .unwrap();

        assert_eq!(booking.driver_id, Some(driver_id));

        let trail = state.audit_log.get(&booking_id).unwrap();
        assert_eq!(trail[0].source, "rebalance");
    }

    #[test]
    fn assignment_by_code_resolves_booking() {
        let state = state();
        let booking_id = seed_booking(&state, 14.60, 120.98);
        let driver_id = seed_driver(&state, 14.60, 120.98, 0);
        let code = state.bookings.get(&booking_id).unwrap().code.clone();

        let booking = assign(
            &state,
            None,
            Some(&code),
            Some(driver_id),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap();

        assert_eq!(booking.id, booking_id);
    }

    #[test]
    fn unknown_booking_is_not_found() {
        let state = state();
        let err = assign(
            &state,
            None,
            Some("JR-9999"),
            Some(Uuid::new_v4()),
            AssignmentMode::Manual,
            "dispatcher",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BookingNotFound(_)));
    }
}
