use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketRequestStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub title: String,
    pub goods_type: String,
    pub description: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub budget: Option<f64>,
    pub status: MarketRequestStatus,
    pub created_at: DateTime<Utc>,
}
