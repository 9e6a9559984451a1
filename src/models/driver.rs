use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub online: bool,
    pub location: GeoPoint,
    /// Only location pings move this; the freshness window in auto-nearest
    /// selection is checked against it.
    pub location_updated_at: DateTime<Utc>,
    pub wallet_balance: f64,
    pub min_required_balance: f64,
    pub wallet_locked: bool,
    pub zone: String,
}
