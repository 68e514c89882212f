use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PickupType, TimeWindow};
use crate::services::pricing;

/// Request to create a booking. Exactly one of `pickup_location_id` /
/// `delivery_address` must be set, matching the pickup type.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub bike_id: String,
    pub user_id: String,
    pub window: TimeWindow,
    pub pickup_type: PickupType,
    pub pickup_location_id: Option<String>,
    pub delivery_address: Option<String>,
}

/// Create a booking in status `Confirmed`. The price is always recomputed
/// server-side from the bike's rate sheet; client-supplied totals are never
/// trusted. A single INSERT means a failed call leaves no partial state.
pub fn create(conn: &Connection, req: &NewBooking) -> Result<Booking, AppError> {
    if !req.window.is_valid() {
        return Err(AppError::InvalidWindow { field: "drop_ts" });
    }

    match req.pickup_type {
        PickupType::Station => {
            if req.delivery_address.is_some() {
                return Err(AppError::BookingCreationFailed(
                    "station pickup does not take a delivery address".to_string(),
                ));
            }
            let Some(location_id) = req.pickup_location_id.as_deref() else {
                return Err(AppError::BookingCreationFailed(
                    "station pickup requires a pickup location".to_string(),
                ));
            };
            let location = queries::get_location(conn, location_id)?;
            if !location.is_some_and(|l| l.is_active) {
                return Err(AppError::BookingCreationFailed(
                    "unknown or inactive pickup location".to_string(),
                ));
            }
        }
        PickupType::Doorstep => {
            if req.pickup_location_id.is_some() {
                return Err(AppError::BookingCreationFailed(
                    "doorstep delivery does not take a pickup location".to_string(),
                ));
            }
            if req.delivery_address.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::BookingCreationFailed(
                    "doorstep delivery requires a delivery address".to_string(),
                ));
            }
        }
    }

    let bike = queries::get_bike(conn, &req.bike_id)?
        .ok_or_else(|| AppError::BookingCreationFailed(format!("unknown bike {}", req.bike_id)))?;

    let quote = pricing::quote(&bike.rates, Some(&req.window), req.pickup_type);
    if quote.is_zeroed() {
        return Err(AppError::InvalidWindow { field: "drop_ts" });
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        bike_id: req.bike_id.clone(),
        user_id: req.user_id.clone(),
        pickup_ts: req.window.pickup,
        drop_ts: req.window.drop_off,
        rental_type: quote.rental_type,
        pickup_type: req.pickup_type,
        pickup_location_id: req.pickup_location_id.clone(),
        delivery_address: req.delivery_address.clone(),
        tax_amount: quote.tax,
        discount_amount: 0,
        total_amount: quote.total,
        status: BookingStatus::Confirmed,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(conn, &booking)
        .map_err(|e| AppError::BookingCreationFailed(e.to_string()))?;

    tracing::info!(
        booking_id = %booking.id,
        bike_id = %booking.bike_id,
        rental_type = booking.rental_type.as_str(),
        total = booking.total_amount,
        "booking confirmed"
    );

    Ok(booking)
}

/// Bookings for a user, newest first. The ordering is a contract this
/// manager owns, so it is enforced here rather than assumed from the store.
pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Booking>, AppError> {
    let mut bookings = queries::get_bookings_for_user(conn, user_id)?;
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(bookings)
}

/// Cancel a confirmed booking. Cancellation is not idempotent: a booking
/// that is already cancelled, ongoing, or completed is rejected and left
/// untouched. Ongoing/completed transitions are driven by time-based jobs
/// elsewhere and are never written here.
pub fn cancel(conn: &Connection, booking_id: &str) -> Result<Booking, AppError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    if !booking.status.can_cancel() {
        return Err(AppError::IllegalTransition {
            from: booking.status.as_str(),
        });
    }

    queries::update_booking_status(conn, booking_id, &BookingStatus::Cancelled)?;
    tracing::info!(booking_id = %booking_id, "booking cancelled");

    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))
}
