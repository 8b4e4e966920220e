use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BidReceived,
    BidAccepted,
    BidRejected,
    BidWithdrawn,
    BookingUpdated,
    QuoteRequested,
    QuoteAnswered,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::BidReceived => "bid_received",
            NotificationKind::BidAccepted => "bid_accepted",
            NotificationKind::BidRejected => "bid_rejected",
            NotificationKind::BidWithdrawn => "bid_withdrawn",
            NotificationKind::BookingUpdated => "booking_updated",
            NotificationKind::QuoteRequested => "quote_requested",
            NotificationKind::QuoteAnswered => "quote_answered",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
