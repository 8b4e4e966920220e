use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::api::auth::TokenVerifier;
use crate::engine::events::LifecycleEvent;
use crate::models::bid::Bid;
use crate::models::booking::Booking;
use crate::models::load::Load;
use crate::models::market_request::MarketRequest;
use crate::models::notification::Notification;
use crate::models::truck::{QuoteRequest, Truck};
use crate::observability::metrics::Metrics;

// Lock order when more than one map entry is held: loads, then bids, then bookings.
// Bids carry their shipper so bid lookups never need to reach back into loads.
pub struct AppState {
    pub loads: DashMap<Uuid, Load>,
    pub bids: DashMap<Uuid, Bid>,
    pub bookings: DashMap<Uuid, Booking>,
    pub trucks: DashMap<Uuid, Truck>,
    pub quote_requests: DashMap<Uuid, QuoteRequest>,
    pub market_requests: DashMap<Uuid, MarketRequest>,
    pub notifications: DashMap<Uuid, Notification>,
    pub event_tx: mpsc::Sender<LifecycleEvent>,
    pub notification_tx: broadcast::Sender<Notification>,
    pub verifier: TokenVerifier,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        auth_secret: &str,
        event_queue_size: usize,
        notification_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<LifecycleEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_queue_size);
        let (notification_tx, _unused_rx) = broadcast::channel(notification_buffer_size);

        (
            Self {
                loads: DashMap::new(),
                bids: DashMap::new(),
                bookings: DashMap::new(),
                trucks: DashMap::new(),
                quote_requests: DashMap::new(),
                market_requests: DashMap::new(),
                notifications: DashMap::new(),
                event_tx,
                notification_tx,
                verifier: TokenVerifier::new(auth_secret),
                metrics: Metrics::new(),
            },
            event_rx,
        )
    }
}
