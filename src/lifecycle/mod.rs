use crate::models::booking::BookingStatus;

/// The single authority on legal status moves. Every mutation path runs its
/// intended transition through here before committing; anything not
/// enumerated is rejected.
pub fn transition_allowed(current: BookingStatus, next: BookingStatus) -> bool {
    use BookingStatus::*;

    if current == next {
        return false;
    }

    match (current, next) {
        // forward dispatch path
        (Pending, Assigned) => true,
        (Assigned, OnTheWay) => true,
        (OnTheWay, OnTrip) => true,
        (OnTrip, Completed) => true,

        // fare negotiation detour
        (Pending, AwaitingPassengerConfirmation) => true,
        (Assigned, AwaitingPassengerConfirmation) => true,
        (AwaitingPassengerConfirmation, Ready) => true,
        (Ready, OnTheWay) => true,

        // re-dispatch path: fare rejection or driver decline
        (Assigned, Pending) => true,
        (AwaitingPassengerConfirmation, Pending) => true,

        // abandonment, from any non-terminal state
        (_, Cancelled) | (_, Declined) => !is_terminal(current),

        _ => false,
    }
}

pub fn is_terminal(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Declined
    )
}

/// Statuses counted as an active trip for zone capacity reporting.
pub fn is_active_trip(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Assigned
            | BookingStatus::AwaitingPassengerConfirmation
            | BookingStatus::Ready
            | BookingStatus::OnTheWay
            | BookingStatus::OnTrip
    )
}

#[cfg(test)]
mod tests {
    use super::{is_terminal, transition_allowed};
    use crate::models::booking::BookingStatus::*;

    #[test]
    fn forward_path_is_legal() {
        assert!(transition_allowed(Pending, Assigned));
        assert!(transition_allowed(Assigned, OnTheWay));
        assert!(transition_allowed(OnTheWay, OnTrip));
        assert!(transition_allowed(OnTrip, Completed));
    }

    #[test]
    fn fare_detour_is_legal() {
        assert!(transition_allowed(Pending, AwaitingPassengerConfirmation));
        assert!(transition_allowed(Assigned, AwaitingPassengerConfirmation));
        assert!(transition_allowed(AwaitingPassengerConfirmation, Ready));
        assert!(transition_allowed(Ready, OnTheWay));
    }

    #[test]
    fn redispatch_returns_to_pending() {
        assert!(transition_allowed(Assigned, Pending));
        assert!(transition_allowed(AwaitingPassengerConfirmation, Pending));
        assert!(!transition_allowed(OnTrip, Pending));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!transition_allowed(Pending, OnTheWay));
        assert!(!transition_allowed(Pending, OnTrip));
        assert!(!transition_allowed(Assigned, Completed));
        assert!(!transition_allowed(Pending, Completed));
    }

    #[test]
    fn self_transition_is_rejected() {
        assert!(!transition_allowed(Pending, Pending));
        assert!(!transition_allowed(Assigned, Assigned));
    }

    #[test]
    fn cancel_and_decline_reachable_from_non_terminal_only() {
        for from in [Pending, Assigned, AwaitingPassengerConfirmation, Ready, OnTheWay, OnTrip] {
            assert!(transition_allowed(from, Cancelled), "{from:?}");
            assert!(transition_allowed(from, Declined), "{from:?}");
        }
        for from in [Completed, Cancelled, Declined] {
            assert!(!transition_allowed(from, Cancelled), "{from:?}");
            assert!(!transition_allowed(from, Declined), "{from:?}");
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [Completed, Cancelled, Declined] {
            assert!(is_terminal(from));
            for to in [Pending, Assigned, OnTheWay, OnTrip, Completed] {
                assert!(!transition_allowed(from, to), "{from:?} -> {to:?}");
            }
        }
    }
}
