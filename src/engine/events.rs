use uuid::Uuid;

use crate::error::AppError;
use crate::models::bid::Bid;
use crate::models::booking::Booking;
use crate::models::truck::QuoteRequest;
use crate::state::AppState;

/// Something that happened in the marketplace that participants should hear about.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    BidPlaced { bid: Bid },
    BidAccepted { bid: Bid, booking_id: Uuid },
    BidRejected { bid: Bid, superseded: bool },
    BidWithdrawn { bid: Bid },
    BookingUpdated { booking: Booking, actor_id: Uuid },
    QuoteRequested { request: QuoteRequest },
    QuoteAnswered { request: QuoteRequest },
}

/// Queues an event for the notifier. The gauge is raised before the send so
/// the notifier's decrement can never run first.
pub async fn emit_event(state: &AppState, event: LifecycleEvent) -> Result<(), AppError> {
    state.metrics.lifecycle_events_in_queue.inc();

    if let Err(err) = state.event_tx.send(event).await {
        state.metrics.lifecycle_events_in_queue.dec();
        return Err(AppError::Internal(format!("event queue send failed: {err}")));
    }

    Ok(())
}

pub async fn emit_all(state: &AppState, events: Vec<LifecycleEvent>) -> Result<(), AppError> {
    for event in events {
        emit_event(state, event).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{emit_event, LifecycleEvent};
    use crate::error::AppError;
    use crate::models::bid::{Bid, BidStatus};
    use crate::state::AppState;

    fn placed() -> LifecycleEvent {
        LifecycleEvent::BidPlaced {
            bid: Bid {
                id: Uuid::new_v4(),
                load_id: Uuid::new_v4(),
                shipper_id: Uuid::from_u128(1),
                carrier_id: Uuid::from_u128(2),
                quoted_price: 90_000.0,
                currency: "PKR".to_string(),
                estimated_days: 2,
                message: None,
                status: BidStatus::Pending,
                reason: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn queued_event_raises_gauge() {
        let (state, mut rx) = AppState::new("test-secret", 4, 4);

        emit_event(&state, placed()).await.unwrap();

        assert_eq!(state.metrics.lifecycle_events_in_queue.get(), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn failed_send_leaves_gauge_untouched() {
        let (state, rx) = AppState::new("test-secret", 4, 4);
        drop(rx);

        let result = emit_event(&state, placed()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(state.metrics.lifecycle_events_in_queue.get(), 0);
    }
}
