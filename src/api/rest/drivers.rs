use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/status", patch(update_status))
        .route("/drivers/:id/location", patch(update_location))
        .route("/drivers/:id/wallet", patch(update_wallet))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub zone: String,
    pub location: GeoPoint,
    pub wallet_balance: f64,
    pub min_required_balance: f64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateWalletRequest {
    pub balance: Option<f64>,
    pub min_required_balance: Option<f64>,
    pub locked: Option<bool>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if payload.zone.trim().is_empty() {
        return Err(AppError::Validation("zone cannot be empty".to_string()));
    }
    if !payload.wallet_balance.is_finite() || payload.wallet_balance < 0.0 {
        return Err(AppError::Validation(
            "wallet_balance must be a non-negative amount".to_string(),
        ));
    }
    if !payload.min_required_balance.is_finite() || payload.min_required_balance < 0.0 {
        return Err(AppError::Validation(
            "min_required_balance must be a non-negative amount".to_string(),
        ));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        online: true,
        location: payload.location,
        location_updated_at: Utc::now(),
        wallet_balance: payload.wallet_balance,
        min_required_balance: payload.min_required_balance,
        wallet_locked: false,
        zone: payload.zone,
    };

    state.drivers.insert(driver.id, driver.clone());
    info!(driver_id = %driver.id, zone = %driver.zone, "driver registered");
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let drivers = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(drivers)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    driver.online = payload.online;

    Ok(Json(driver.clone()))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    driver.location = payload.location;
    driver.location_updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn update_wallet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWalletRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    if let Some(balance) = payload.balance {
        if !balance.is_finite() || balance < 0.0 {
            return Err(AppError::Validation(
                "balance must be a non-negative amount".to_string(),
            ));
        }
        driver.wallet_balance = balance;
    }
    if let Some(required) = payload.min_required_balance {
        if !required.is_finite() || required < 0.0 {
            return Err(AppError::Validation(
                "min_required_balance must be a non-negative amount".to_string(),
            ));
        }
        driver.min_required_balance = required;
    }
    if let Some(locked) = payload.locked {
        driver.wallet_locked = locked;
    }

    Ok(Json(driver.clone()))
}
