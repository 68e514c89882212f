use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{Bike, Booking, BookingStatus, Location, PickupType, RateSheet, RentalType};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Bikes (rate catalog) ──

pub fn insert_bike(conn: &Connection, bike: &Bike) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bikes (id, name, brand, rate_per_hour, rate_per_day, rate_per_7_days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           brand = excluded.brand,
           rate_per_hour = excluded.rate_per_hour,
           rate_per_day = excluded.rate_per_day,
           rate_per_7_days = excluded.rate_per_7_days",
        params![
            bike.id,
            bike.name,
            bike.brand,
            bike.rates.rate_per_hour,
            bike.rates.rate_per_day,
            bike.rates.rate_per_7_days,
        ],
    )?;
    Ok(())
}

pub fn get_bike(conn: &Connection, id: &str) -> anyhow::Result<Option<Bike>> {
    let result = conn.query_row(
        "SELECT id, name, brand, rate_per_hour, rate_per_day, rate_per_7_days
         FROM bikes WHERE id = ?1",
        params![id],
        |row| {
            Ok(Bike {
                id: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
                rates: RateSheet {
                    rate_per_hour: row.get(3)?,
                    rate_per_day: row.get(4)?,
                    rate_per_7_days: row.get(5)?,
                },
            })
        },
    );

    match result {
        Ok(bike) => Ok(Some(bike)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Locations ──

pub fn insert_location(conn: &Connection, location: &Location) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO locations (id, address, city, is_active)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           address = excluded.address,
           city = excluded.city,
           is_active = excluded.is_active",
        params![location.id, location.address, location.city, location.is_active],
    )?;
    Ok(())
}

pub fn get_active_locations(conn: &Connection) -> anyhow::Result<Vec<Location>> {
    let mut stmt = conn.prepare(
        "SELECT id, address, city, is_active FROM locations WHERE is_active = 1 ORDER BY city, address",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Location {
            id: row.get(0)?,
            address: row.get(1)?,
            city: row.get(2)?,
            is_active: row.get(3)?,
        })
    })?;

    let mut locations = vec![];
    for row in rows {
        locations.push(row?);
    }
    Ok(locations)
}

pub fn get_location(conn: &Connection, id: &str) -> anyhow::Result<Option<Location>> {
    let result = conn.query_row(
        "SELECT id, address, city, is_active FROM locations WHERE id = ?1",
        params![id],
        |row| {
            Ok(Location {
                id: row.get(0)?,
                address: row.get(1)?,
                city: row.get(2)?,
                is_active: row.get(3)?,
            })
        },
    );

    match result {
        Ok(location) => Ok(Some(location)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, bike_id, user_id, pickup_ts, drop_ts, rental_type, pickup_type, \
     pickup_location_id, delivery_address, tax_amount, discount_amount, total_amount, status, \
     created_at, updated_at";

fn parse_booking_row(row: &Row<'_>) -> anyhow::Result<Booking> {
    let pickup_ts: String = row.get(3)?;
    let drop_ts: String = row.get(4)?;
    let rental_type: String = row.get(5)?;
    let pickup_type: String = row.get(6)?;
    let status: String = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Booking {
        id: row.get(0)?,
        bike_id: row.get(1)?,
        user_id: row.get(2)?,
        pickup_ts: parse_ts(&pickup_ts),
        drop_ts: parse_ts(&drop_ts),
        rental_type: RentalType::from_str(&rental_type),
        pickup_type: PickupType::from_str(&pickup_type),
        pickup_location_id: row.get(7)?,
        delivery_address: row.get(8)?,
        tax_amount: row.get(9)?,
        discount_amount: row.get(10)?,
        total_amount: row.get(11)?,
        status: BookingStatus::from_str(&status),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, bike_id, user_id, pickup_ts, drop_ts, rental_type, pickup_type,
            pickup_location_id, delivery_address, tax_amount, discount_amount, total_amount, status,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.bike_id,
            booking.user_id,
            booking.pickup_ts.format(TS_FORMAT).to_string(),
            booking.drop_ts.format(TS_FORMAT).to_string(),
            booking.rental_type.as_str(),
            booking.pickup_type.as_str(),
            booking.pickup_location_id,
            booking.delivery_address,
            booking.tax_amount,
            booking.discount_amount,
            booking.total_amount,
            booking.status.as_str(),
            booking.created_at.format(TS_FORMAT).to_string(),
            booking.updated_at.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC",
    ))?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

// ── Session tokens ──

pub fn get_session_token(conn: &Connection, namespace: &str) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT token FROM session_tokens WHERE namespace = ?1",
        params![namespace],
        |row| row.get(0),
    );

    match result {
        Ok(token) => Ok(Some(token)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_session_token(conn: &Connection, namespace: &str, token: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO session_tokens (namespace, token) VALUES (?1, ?2)
         ON CONFLICT(namespace) DO UPDATE SET token = excluded.token",
        params![namespace, token],
    )?;
    Ok(())
}

pub fn clear_session_token(conn: &Connection, namespace: &str) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM session_tokens WHERE namespace = ?1",
        params![namespace],
    )?;
    Ok(())
}
