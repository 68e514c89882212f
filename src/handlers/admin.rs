use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Bike, Location};
use crate::state::AppState;

// POST /api/admin/bikes
pub async fn upsert_bike(
    State(state): State<Arc<AppState>>,
    Json(bike): Json<Bike>,
) -> Result<StatusCode, AppError> {
    super::require_admin(&state, "/admin/bikes").await?;

    {
        let db = state.db.lock().unwrap();
        queries::insert_bike(&db, &bike)?;
    }
    tracing::info!(bike_id = %bike.id, "bike rate sheet updated");

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/locations
pub async fn upsert_location(
    State(state): State<Arc<AppState>>,
    Json(location): Json<Location>,
) -> Result<StatusCode, AppError> {
    super::require_admin(&state, "/admin/locations").await?;

    {
        let db = state.db.lock().unwrap();
        queries::insert_location(&db, &location)?;
    }
    tracing::info!(location_id = %location.id, "location updated");

    Ok(StatusCode::NO_CONTENT)
}
