use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::DispatchSettings;
use crate::models::audit::AuditEntry;
use crate::models::booking::Booking;
use crate::models::driver::Driver;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub bookings: DashMap<Uuid, Booking>,
    /// Secondary index: human booking code -> booking id.
    pub booking_codes: DashMap<String, Uuid>,
    pub drivers: DashMap<Uuid, Driver>,
    /// Per-booking audit trail, append-only.
    pub audit_log: DashMap<Uuid, Vec<AuditEntry>>,
    pub audit_events_tx: broadcast::Sender<AuditEntry>,
    pub settings: DispatchSettings,
    pub metrics: Metrics,
    booking_seq: AtomicU64,
}

impl AppState {
    pub fn new(settings: DispatchSettings, event_buffer_size: usize) -> Self {
        let (audit_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            bookings: DashMap::new(),
            booking_codes: DashMap::new(),
            drivers: DashMap::new(),
            audit_log: DashMap::new(),
            audit_events_tx,
            settings,
            metrics: Metrics::new(),
            booking_seq: AtomicU64::new(0),
        }
    }

    /// Allocates the next `JR-…` code. Codes start at JR-1001 and are unique
    /// for the life of the process.
    pub fn next_booking_code(&self) -> String {
        let n = self.booking_seq.fetch_add(1, Ordering::Relaxed);
        format!("JR-{}", 1001 + n)
    }

    /// Resolves either lookup key to the booking id.
    pub fn resolve_booking(&self, id: Option<Uuid>, code: Option<&str>) -> Option<Uuid> {
        if let Some(id) = id {
            return self.bookings.contains_key(&id).then_some(id);
        }
        code.and_then(|code| self.booking_codes.get(code).map(|entry| *entry.value()))
    }

    /// Appends to the booking's audit trail and fans the entry out to event
    /// subscribers. Entries are never rewritten.
    pub fn record_audit(&self, entry: AuditEntry) {
        self.metrics.audit_entries_total.inc();
        self.audit_log
            .entry(entry.booking_id)
            .or_default()
            .push(entry.clone());
        let _ = self.audit_events_tx.send(entry);
    }
}
