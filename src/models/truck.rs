use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub id: Uuid,
    pub carrier_id: Uuid,
    pub registration: String,
    pub truck_type: String,
    pub capacity_kg: f64,
    pub rate_per_km: f64,
    pub home_city: String,
    pub verified: bool,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteRequestStatus {
    Pending,
    Quoted,
    Declined,
}

/// A shipper asking the owner of a listed truck for a price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: Uuid,
    pub truck_id: Uuid,
    pub shipper_id: Uuid,
    pub carrier_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub cargo_type: String,
    pub weight_kg: f64,
    pub pickup_date: NaiveDate,
    pub message: Option<String>,
    pub status: QuoteRequestStatus,
    pub quoted_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
