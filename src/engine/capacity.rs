use std::collections::BTreeMap;

use serde::Serialize;

use crate::lifecycle;
use crate::state::AppState;

/// Derived per-zone view: online drivers and trips currently in flight.
/// Recomputed on demand, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCapacity {
    pub zone: String,
    pub online_drivers: usize,
    pub active_trips: usize,
}

pub fn zone_capacity(state: &AppState) -> Vec<ZoneCapacity> {
    let mut zones: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for entry in state.drivers.iter() {
        let driver = entry.value();
        let slot = zones.entry(driver.zone.clone()).or_default();
        if driver.online {
            slot.0 += 1;
        }
    }

    for entry in state.bookings.iter() {
        let booking = entry.value();
        if !lifecycle::is_active_trip(booking.status) {
            continue;
        }
        // active trips are attributed to the assigned driver's zone
        let Some(driver_id) = booking.driver_id else {
            continue;
        };
        let Some(driver) = state.drivers.get(&driver_id) else {
            continue;
        };
        zones.entry(driver.zone.clone()).or_default().1 += 1;
    }

    zones
        .into_iter()
        .map(|(zone, (online_drivers, active_trips))| ZoneCapacity {
            zone,
            online_drivers,
            active_trips,
        })
        .collect()
}
