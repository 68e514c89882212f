use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub bike_id: String,
    pub user_id: String,
    pub pickup_ts: NaiveDateTime,
    pub drop_ts: NaiveDateTime,
    pub rental_type: RentalType,
    pub pickup_type: PickupType,
    pub pickup_location_id: Option<String>,
    pub delivery_address: Option<String>,
    pub tax_amount: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Booking lifecycle. Only `Confirmed` is creatable here, and the only
/// transition this service performs is `Confirmed -> Cancelled`. `Ongoing`
/// and `Completed` are written by time-based jobs outside this service and
/// are read-only facts from its point of view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Ongoing,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ongoing" => BookingStatus::Ongoing,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

/// Derived rental tier. Never stored as an input, always recomputed from the
/// window at quote time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RentalType {
    #[default]
    Hourly,
    Daily,
    Weekly,
}

impl RentalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalType::Hourly => "hourly",
            RentalType::Daily => "daily",
            RentalType::Weekly => "weekly",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "daily" => RentalType::Daily,
            "weekly" => RentalType::Weekly,
            _ => RentalType::Hourly,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PickupType {
    Station,
    Doorstep,
}

impl PickupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupType::Station => "station",
            PickupType::Doorstep => "doorstep",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "doorstep" => PickupType::Doorstep,
            _ => PickupType::Station,
        }
    }
}
