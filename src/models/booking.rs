use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InTransit,
    Delivered,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InTransit => "in_transit",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Physical progress of the shipment behind a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Booked,
    Pickup,
    InTransit,
    Customs,
    Delivered,
}

impl Milestone {
    pub fn as_str(self) -> &'static str {
        match self {
            Milestone::Booked => "booked",
            Milestone::Pickup => "pickup",
            Milestone::InTransit => "in_transit",
            Milestone::Customs => "customs",
            Milestone::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub load_id: Uuid,
    pub shipper_id: Uuid,
    pub carrier_id: Uuid,
    pub agreed_price: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub milestone: Milestone,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.shipper_id == user_id || self.carrier_id == user_id
    }
}
