use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, PickupType, TimeWindow};
use crate::services::booking as lifecycle;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    bike_id: String,
    pickup_ts: String,
    drop_ts: String,
    rental_type: String,
    pickup_type: String,
    pickup_location_id: Option<String>,
    delivery_address: Option<String>,
    tax_amount: i64,
    discount_amount: i64,
    total_amount: i64,
    status: String,
    created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            bike_id: b.bike_id,
            pickup_ts: b.pickup_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            drop_ts: b.drop_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            rental_type: b.rental_type.as_str().to_string(),
            pickup_type: b.pickup_type.as_str().to_string(),
            pickup_location_id: b.pickup_location_id,
            delivery_address: b.delivery_address,
            tax_amount: b.tax_amount,
            discount_amount: b.discount_amount,
            total_amount: b.total_amount,
            status: b.status.as_str().to_string(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub bike_id: String,
    pub pickup_ts: String,
    pub drop_ts: String,
    pub pickup_type: PickupType,
    pub pickup_location_id: Option<String>,
    pub delivery_address: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let user = super::require_user(&state, "/bookings/new").await?;

    let pickup = super::parse_ts(&req.pickup_ts, "pickup_ts")?;
    let drop_off = super::parse_ts(&req.drop_ts, "drop_ts")?;

    let new_booking = lifecycle::NewBooking {
        bike_id: req.bike_id,
        user_id: user.id,
        window: TimeWindow::new(pickup, drop_off),
        pickup_type: req.pickup_type,
        pickup_location_id: req.pickup_location_id,
        delivery_address: req.delivery_address,
    };

    let booking = {
        let db = state.db.lock().unwrap();
        lifecycle::create(&db, &new_booking)?
    };

    Ok(Json(booking.into()))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let user = super::require_user(&state, "/bookings").await?;

    let bookings = {
        let db = state.db.lock().unwrap();
        lifecycle::list_for_user(&db, &user.id)?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let user = super::require_user(&state, "/bookings").await?;

    let booking = {
        let db = state.db.lock().unwrap();

        // Users may only touch their own bookings; a foreign id looks the
        // same as an unknown one.
        let owned = crate::db::queries::get_booking_by_id(&db, &id)?
            .is_some_and(|b| b.user_id == user.id);
        if !owned {
            return Err(AppError::NotFound(format!("booking {id}")));
        }

        lifecycle::cancel(&db, &id)?
    };

    Ok(Json(booking.into()))
}
