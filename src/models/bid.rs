use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Confirmed,
    Cancelled,
    Rejected,
}

impl BidStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Confirmed => "confirmed",
            BidStatus::Cancelled => "cancelled",
            BidStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub load_id: Uuid,
    pub shipper_id: Uuid,
    pub carrier_id: Uuid,
    pub quoted_price: f64,
    pub currency: String,
    pub estimated_days: u32,
    pub message: Option<String>,
    pub status: BidStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
