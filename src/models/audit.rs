use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of an assignment-affecting action. Written for every
/// assignment, reassignment and unassignment, and for failed assignment
/// attempts (with the failure code as `reason`). Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub from_driver: Option<Uuid>,
    pub to_driver: Option<Uuid>,
    pub actor: String,
    /// Which path produced the entry: `manual`, `auto_nearest`, `rebalance`,
    /// `fare_reject`, `driver_decline`, `cancel`.
    pub source: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        booking_id: Uuid,
        from_driver: Option<Uuid>,
        to_driver: Option<Uuid>,
        actor: &str,
        source: &str,
        reason: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            from_driver,
            to_driver,
            actor: actor.to_string(),
            source: source.to_string(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        }
    }
}
