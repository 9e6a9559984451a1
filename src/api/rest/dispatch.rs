use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::engine::assignment::{AssignmentMode, assign};
use crate::engine::capacity::{ZoneCapacity, zone_capacity};
use crate::error::AppError;
use crate::models::audit::AuditEntry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assignments", post(create_assignment))
        .route("/assignment-audit", get(assignment_audit))
        .route("/zone-capacity", get(get_zone_capacity))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub booking_id: Option<Uuid>,
    pub booking_code: Option<String>,
    pub driver_id: Option<Uuid>,
    pub mode: AssignmentMode,
    pub actor: Option<String>,
}

async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = payload.actor.as_deref().unwrap_or("dispatcher");
    let start = Instant::now();

    let result = assign(
        &state,
        payload.booking_id,
        payload.booking_code.as_deref(),
        payload.driver_id,
        payload.mode,
        actor,
    );

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.code(),
    };
    let elapsed = start.elapsed().as_secs_f64();
    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[outcome])
        .observe(elapsed);
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    let booking = result?;
    Ok(Json(json!({ "ok": true, "booking": booking })))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub booking_id: Uuid,
}

#[derive(Serialize)]
pub struct AuditResponse {
    pub booking_id: Uuid,
    pub entries: Vec<AuditEntry>,
}

/// Trail for one booking, most recent first, capped by the configured
/// query limit.
async fn assignment_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Json<AuditResponse> {
    let mut entries: Vec<AuditEntry> = state
        .audit_log
        .get(&query.booking_id)
        .map(|trail| trail.value().clone())
        .unwrap_or_default();

    entries.reverse();
    entries.truncate(state.settings.audit_query_limit);

    Json(AuditResponse {
        booking_id: query.booking_id,
        entries,
    })
}

async fn get_zone_capacity(State(state): State<Arc<AppState>>) -> Json<Vec<ZoneCapacity>> {
    Json(zone_capacity(&state))
}
