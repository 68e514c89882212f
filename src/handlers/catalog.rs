use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Location, PickupType, RateSheet, TimeWindow};
use crate::services::pricing::{self, Quote};
use crate::state::AppState;

// GET /api/locations
pub async fn get_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = {
        let db = state.db.lock().unwrap();
        queries::get_active_locations(&db)?
    };
    Ok(Json(locations))
}

// GET /api/bikes/:id/rates
pub async fn get_bike_rates(
    State(state): State<Arc<AppState>>,
    Path(bike_id): Path<String>,
) -> Result<Json<RateSheet>, AppError> {
    let bike = {
        let db = state.db.lock().unwrap();
        queries::get_bike(&db, &bike_id)?
    };
    let bike = bike.ok_or_else(|| AppError::NotFound(format!("bike {bike_id}")))?;
    Ok(Json(bike.rates))
}

// POST /api/quote
#[derive(Deserialize)]
pub struct QuoteRequest {
    pub bike_id: String,
    pub pickup_ts: String,
    pub drop_ts: String,
    pub pickup_type: PickupType,
}

pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let pickup = super::parse_ts(&req.pickup_ts, "pickup_ts")?;
    let drop_off = super::parse_ts(&req.drop_ts, "drop_ts")?;
    let window = TimeWindow::new(pickup, drop_off);
    if !window.is_valid() {
        return Err(AppError::InvalidWindow { field: "drop_ts" });
    }

    let bike = {
        let db = state.db.lock().unwrap();
        queries::get_bike(&db, &req.bike_id)?
    };
    let bike = bike.ok_or_else(|| AppError::NotFound(format!("bike {}", req.bike_id)))?;

    Ok(Json(pricing::quote(
        &bike.rates,
        Some(&window),
        req.pickup_type,
    )))
}
