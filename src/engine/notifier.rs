use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::events::LifecycleEvent;
use crate::models::booking::BookingStatus;
use crate::models::notification::{Notification, NotificationKind, NotificationPriority};
use crate::state::AppState;

pub async fn run_notifier(state: Arc<AppState>, mut event_rx: mpsc::Receiver<LifecycleEvent>) {
    info!("notifier started");

    while let Some(event) = event_rx.recv().await {
        state.metrics.lifecycle_events_in_queue.dec();

        for notification in notifications_for(&event) {
            deliver(&state, notification);
        }
    }

    warn!("notifier stopped: event channel closed");
}

fn deliver(state: &AppState, notification: Notification) {
    state
        .metrics
        .notifications_total
        .with_label_values(&[notification.kind.as_str()])
        .inc();

    state
        .notifications
        .insert(notification.id, notification.clone());

    debug!(
        notification_id = %notification.id,
        recipient_id = %notification.recipient_id,
        kind = notification.kind.as_str(),
        "notification stored"
    );

    // No live subscribers is the common case.
    let _ = state.notification_tx.send(notification);
}

pub fn notifications_for(event: &LifecycleEvent) -> Vec<Notification> {
    match event {
        LifecycleEvent::BidPlaced { bid } => vec![build(
            bid.shipper_id,
            NotificationKind::BidReceived,
            "New bid on your load",
            format!(
                "A carrier quoted {:.0} {} with delivery in {} days.",
                bid.quoted_price, bid.currency, bid.estimated_days
            ),
            NotificationPriority::Normal,
            Some(format!("/loads/{}", bid.load_id)),
        )],
        LifecycleEvent::BidAccepted { bid, booking_id } => vec![build(
            bid.carrier_id,
            NotificationKind::BidAccepted,
            "Your bid was accepted",
            format!(
                "Your quote of {:.0} {} was accepted and a booking was created.",
                bid.quoted_price, bid.currency
            ),
            NotificationPriority::High,
            Some(format!("/bookings/{booking_id}")),
        )],
        LifecycleEvent::BidRejected { bid, superseded } => {
            let body = if *superseded {
                "Another bid was selected for this load.".to_string()
            } else {
                match &bid.reason {
                    Some(reason) => format!("The shipper declined your bid: {reason}"),
                    None => "The shipper declined your bid.".to_string(),
                }
            };
            vec![build(
                bid.carrier_id,
                NotificationKind::BidRejected,
                "Your bid was not selected",
                body,
                NotificationPriority::Normal,
                Some(format!("/quotes/{}", bid.id)),
            )]
        }
        LifecycleEvent::BidWithdrawn { bid } => vec![build(
            bid.shipper_id,
            NotificationKind::BidWithdrawn,
            "A bid was withdrawn",
            format!(
                "A carrier withdrew their bid: {}",
                bid.reason.as_deref().unwrap_or("no reason given")
            ),
            NotificationPriority::Low,
            Some(format!("/loads/{}", bid.load_id)),
        )],
        LifecycleEvent::BookingUpdated { booking, actor_id } => {
            let priority = match booking.status {
                BookingStatus::Delivered | BookingStatus::Cancelled => NotificationPriority::High,
                _ => NotificationPriority::Normal,
            };
            let body = if booking.status == BookingStatus::Cancelled {
                "The booking was cancelled.".to_string()
            } else {
                format!(
                    "Shipment reached {} ({}% complete).",
                    booking.milestone.as_str(),
                    booking.progress
                )
            };

            [booking.shipper_id, booking.carrier_id]
                .into_iter()
                .filter(|participant| participant != actor_id)
                .map(|participant| {
                    build(
                        participant,
                        NotificationKind::BookingUpdated,
                        "Booking updated",
                        body.clone(),
                        priority,
                        Some(format!("/bookings/{}", booking.id)),
                    )
                })
                .collect()
        }
        LifecycleEvent::QuoteRequested { request } => vec![build(
            request.carrier_id,
            NotificationKind::QuoteRequested,
            "Quote requested for your truck",
            format!(
                "{} from {} to {}, {:.0} kg.",
                request.cargo_type, request.origin, request.destination, request.weight_kg
            ),
            NotificationPriority::Normal,
            Some(format!("/vehicles/quote-requests/{}", request.id)),
        )],
        LifecycleEvent::QuoteAnswered { request } => {
            let body = match request.quoted_price {
                Some(price) => format!("The carrier quoted {price:.0}."),
                None => "The carrier declined your request.".to_string(),
            };
            vec![build(
                request.shipper_id,
                NotificationKind::QuoteAnswered,
                "Your quote request was answered",
                body,
                NotificationPriority::Normal,
                Some(format!("/vehicles/quote-requests/{}", request.id)),
            )]
        }
    }
}

fn build(
    recipient_id: Uuid,
    kind: NotificationKind,
    title: &str,
    body: String,
    priority: NotificationPriority,
    link: Option<String>,
) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        recipient_id,
        kind,
        title: title.to_string(),
        body,
        priority,
        link,
        read: false,
        created_at: Utc::now(),
    }
}
