use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::booking::open_booking;
use crate::engine::events::{emit_all, emit_event, LifecycleEvent};
use crate::engine::lifecycle::{transition, BidAction};
use crate::error::AppError;
use crate::models::bid::{Bid, BidStatus};
use crate::models::booking::Booking;
use crate::models::load::LoadStatus;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub const SUPERSEDED_REASON: &str = "Another bid was selected";

#[derive(Debug, Clone)]
pub struct NewBid {
    pub load_id: Uuid,
    pub quoted_price: f64,
    pub estimated_days: u32,
    pub message: Option<String>,
}

pub async fn place_bid(state: &AppState, actor: &Actor, new_bid: NewBid) -> Result<Bid, AppError> {
    if actor.role != Role::Carrier {
        return Err(AppError::Forbidden("only carriers can place bids".to_string()));
    }

    let bid = {
        // Exclusive access to the load serialises placements and accepts on it.
        let load = state
            .loads
            .get_mut(&new_bid.load_id)
            .ok_or_else(|| AppError::NotFound(format!("load {} not found", new_bid.load_id)))?;

        if load.status != LoadStatus::Available {
            return Err(AppError::Validation(format!(
                "load {} is not available for bidding",
                load.id
            )));
        }

        let already_bidding = state.bids.iter().any(|entry| {
            let existing = entry.value();
            existing.load_id == load.id
                && existing.carrier_id == actor.id
                && existing.status == BidStatus::Pending
        });
        if already_bidding {
            return Err(AppError::Conflict(format!(
                "carrier already has a pending bid on load {}",
                load.id
            )));
        }

        let now = Utc::now();
        let bid = Bid {
            id: Uuid::new_v4(),
            load_id: load.id,
            shipper_id: load.shipper_id,
            carrier_id: actor.id,
            quoted_price: new_bid.quoted_price,
            currency: load.currency.clone(),
            estimated_days: new_bid.estimated_days,
            message: new_bid.message,
            status: BidStatus::Pending,
            reason: None,
            created_at: now,
            updated_at: now,
        };
        state.bids.insert(bid.id, bid.clone());
        bid
    };

    record_transition(state, BidStatus::Pending);
    info!(bid_id = %bid.id, load_id = %bid.load_id, carrier_id = %actor.id, "bid placed");

    emit_event(
        state,
        LifecycleEvent::BidPlaced { bid: bid.clone() },
    )
    .await?;

    Ok(bid)
}

pub async fn withdraw_bid(
    state: &AppState,
    actor: &Actor,
    bid_id: Uuid,
    reason: &str,
) -> Result<Bid, AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::Validation("reason is required".to_string()));
    }

    let bid = {
        let mut bid = state
            .bids
            .get_mut(&bid_id)
            .ok_or_else(|| AppError::NotFound(format!("bid {bid_id} not found")))?;

        if bid.carrier_id != actor.id {
            return Err(AppError::Forbidden(
                "only the bidding carrier can withdraw a bid".to_string(),
            ));
        }

        bid.status = transition(bid.status, BidAction::Withdraw)?;
        bid.reason = Some(reason.trim().to_string());
        bid.updated_at = Utc::now();
        bid.clone()
    };

    record_transition(state, bid.status);
    info!(bid_id = %bid.id, load_id = %bid.load_id, "bid withdrawn");

    emit_event(
        state,
        LifecycleEvent::BidWithdrawn { bid: bid.clone() },
    )
    .await?;

    Ok(bid)
}

pub async fn reject_bid(
    state: &AppState,
    actor: &Actor,
    bid_id: Uuid,
    reason: Option<String>,
) -> Result<Bid, AppError> {
    let bid = {
        let mut bid = state
            .bids
            .get_mut(&bid_id)
            .ok_or_else(|| AppError::NotFound(format!("bid {bid_id} not found")))?;

        authorize_load_owner(actor, bid.shipper_id)?;
        bid.status = transition(bid.status, BidAction::Reject)?;
        bid.reason = reason;
        bid.updated_at = Utc::now();
        bid.clone()
    };

    record_transition(state, bid.status);
    info!(bid_id = %bid.id, load_id = %bid.load_id, "bid rejected");

    emit_event(
        state,
        LifecycleEvent::BidRejected {
            bid: bid.clone(),
            superseded: false,
        },
    )
    .await?;

    Ok(bid)
}

/// Confirms a bid: the load becomes booked, every other pending bid on it is
/// superseded, and a booking is opened. All of it happens while the load
/// entry is held, so two accepts on one load cannot both succeed.
pub async fn accept_bid(
    state: &AppState,
    actor: &Actor,
    bid_id: Uuid,
) -> Result<(Bid, Booking), AppError> {
    let (load_id, shipper_id) = state
        .bids
        .get(&bid_id)
        .map(|bid| (bid.load_id, bid.shipper_id))
        .ok_or_else(|| AppError::NotFound(format!("bid {bid_id} not found")))?;
    authorize_load_owner(actor, shipper_id)?;

    let (bid, booking, events) = {
        let mut load = state
            .loads
            .get_mut(&load_id)
            .ok_or_else(|| AppError::NotFound(format!("load {load_id} not found")))?;

        if load.status != LoadStatus::Available {
            return Err(AppError::Conflict(format!(
                "load {load_id} is no longer available"
            )));
        }

        let bid = {
            let mut bid = state
                .bids
                .get_mut(&bid_id)
                .ok_or_else(|| AppError::NotFound(format!("bid {bid_id} not found")))?;

            bid.status = transition(bid.status, BidAction::Accept)?;
            bid.updated_at = Utc::now();
            bid.clone()
        };
        record_transition(state, bid.status);

        let mut events = supersede_siblings(state, load_id, Some(bid_id), SUPERSEDED_REASON);

        load.status = LoadStatus::Booked;
        load.updated_at = Utc::now();

        let booking = open_booking(&bid, &load);
        state.bookings.insert(booking.id, booking.clone());
        state
            .metrics
            .bookings_by_milestone
            .with_label_values(&[booking.milestone.as_str()])
            .inc();

        events.insert(
            0,
            LifecycleEvent::BidAccepted {
                bid: bid.clone(),
                booking_id: booking.id,
            },
        );
        (bid, booking, events)
    };

    info!(
        bid_id = %bid.id,
        load_id = %load_id,
        booking_id = %booking.id,
        superseded = events.len() - 1,
        "bid accepted"
    );

    emit_all(state, events).await?;

    Ok((bid, booking))
}

/// Rejects every pending bid on `load_id` except `keep`. The caller must
/// already hold the load entry.
pub fn supersede_siblings(
    state: &AppState,
    load_id: Uuid,
    keep: Option<Uuid>,
    reason: &str,
) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    for mut entry in state.bids.iter_mut() {
        let sibling = entry.value_mut();
        if sibling.load_id != load_id || Some(sibling.id) == keep {
            continue;
        }

        if let Ok(status) = transition(sibling.status, BidAction::Supersede) {
            sibling.status = status;
            sibling.reason = Some(reason.to_string());
            sibling.updated_at = Utc::now();
            record_transition(state, status);
            events.push(LifecycleEvent::BidRejected {
                bid: sibling.clone(),
                superseded: true,
            });
        }
    }

    events
}

fn authorize_load_owner(actor: &Actor, shipper_id: Uuid) -> Result<(), AppError> {
    if !actor.owns_or_admin(shipper_id) {
        return Err(AppError::Forbidden(
            "only the load owner can decide on its bids".to_string(),
        ));
    }
    Ok(())
}

fn record_transition(state: &AppState, status: BidStatus) {
    state
        .metrics
        .bid_transitions_total
        .with_label_values(&[status.as_str()])
        .inc();
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::{accept_bid, place_bid, reject_bid, withdraw_bid, NewBid, SUPERSEDED_REASON};
    use crate::engine::events::LifecycleEvent;
    use crate::error::AppError;
    use crate::models::bid::BidStatus;
    use crate::models::load::{Load, LoadStatus};
    use crate::models::user::{Actor, Role};
    use crate::state::AppState;

    fn actor(seed: u128, role: Role) -> Actor {
        Actor {
            id: Uuid::from_u128(seed),
            role,
            name: None,
        }
    }

    fn setup() -> (AppState, mpsc::Receiver<LifecycleEvent>, Load) {
        let (state, rx) = AppState::new("test-secret", 64, 64);
        let load = Load {
            id: Uuid::new_v4(),
            shipper_id: Uuid::from_u128(1),
            origin: "Urumqi".to_string(),
            destination: "Islamabad".to_string(),
            cargo_type: "Machinery".to_string(),
            weight_kg: 20_000.0,
            budget: 600_000.0,
            currency: "PKR".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 12, 8).unwrap(),
            equipment: None,
            notes: None,
            status: LoadStatus::Available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.loads.insert(load.id, load.clone());
        (state, rx, load)
    }

    fn offer(load_id: Uuid, price: f64) -> NewBid {
        NewBid {
            load_id,
            quoted_price: price,
            estimated_days: 4,
            message: Some("Reefer available".to_string()),
        }
    }

    #[tokio::test]
    async fn shippers_cannot_bid() {
        let (state, _rx, load) = setup();
        let result = place_bid(&state, &actor(9, Role::Shipper), offer(load.id, 1.0)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn placed_bid_remembers_the_load_owner() {
        let (state, _rx, load) = setup();
        let bid = place_bid(&state, &actor(10, Role::Carrier), offer(load.id, 1.0)).await.unwrap();
        assert_eq!(bid.shipper_id, load.shipper_id);

        state.loads.remove(&load.id);
        let rejected = reject_bid(&state, &actor(1, Role::Shipper), bid.id, None)
            .await
            .unwrap();
        assert_eq!(rejected.status, BidStatus::Rejected);
    }

    #[tokio::test]
    async fn second_pending_bid_from_same_carrier_conflicts() {
        let (state, _rx, load) = setup();
        let carrier = actor(10, Role::Carrier);

        place_bid(&state, &carrier, offer(load.id, 500_000.0)).await.unwrap();
        let second = place_bid(&state, &carrier, offer(load.id, 490_000.0)).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn withdraw_only_while_pending() {
        let (state, _rx, load) = setup();
        let carrier = actor(10, Role::Carrier);
        let owner = actor(1, Role::Shipper);

        let bid = place_bid(&state, &carrier, offer(load.id, 500_000.0)).await.unwrap();
        accept_bid(&state, &owner, bid.id).await.unwrap();

        let result = withdraw_bid(&state, &carrier, bid.id, "changed plans").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn double_withdraw_conflicts() {
        let (state, _rx, load) = setup();
        let carrier = actor(10, Role::Carrier);

        let bid = place_bid(&state, &carrier, offer(load.id, 500_000.0)).await.unwrap();
        let withdrawn = withdraw_bid(&state, &carrier, bid.id, "truck broke down").await.unwrap();
        assert_eq!(withdrawn.status, BidStatus::Cancelled);
        assert_eq!(withdrawn.reason.as_deref(), Some("truck broke down"));

        let again = withdraw_bid(&state, &carrier, bid.id, "truck broke down").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn withdraw_requires_reason_and_ownership() {
        let (state, _rx, load) = setup();
        let carrier = actor(10, Role::Carrier);
        let other = actor(11, Role::Carrier);

        let bid = place_bid(&state, &carrier, offer(load.id, 500_000.0)).await.unwrap();

        assert!(matches!(
            withdraw_bid(&state, &carrier, bid.id, "  ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            withdraw_bid(&state, &other, bid.id, "mine now").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn accept_books_load_and_supersedes_siblings() {
        let (state, mut rx, load) = setup();
        let owner = actor(1, Role::Shipper);
        let first = actor(10, Role::Carrier);
        let second = actor(11, Role::Carrier);

        let winning = place_bid(&state, &first, offer(load.id, 550_000.0)).await.unwrap();
        let losing = place_bid(&state, &second, offer(load.id, 580_000.0)).await.unwrap();

        let (bid, booking) = accept_bid(&state, &owner, winning.id).await.unwrap();
        assert_eq!(bid.status, BidStatus::Confirmed);
        assert_eq!(booking.bid_id, winning.id);
        assert_eq!(state.loads.get(&load.id).unwrap().status, LoadStatus::Booked);

        let loser = state.bids.get(&losing.id).unwrap().clone();
        assert_eq!(loser.status, BidStatus::Rejected);
        assert_eq!(loser.reason.as_deref(), Some(SUPERSEDED_REASON));

        let mut superseded_events = 0;
        while let Ok(event) = rx.try_recv() {
            if let LifecycleEvent::BidRejected { superseded: true, bid } = event {
                assert_eq!(bid.id, losing.id);
                superseded_events += 1;
            }
        }
        assert_eq!(superseded_events, 1);
    }

    #[tokio::test]
    async fn only_one_bid_per_load_is_confirmed() {
        let (state, _rx, load) = setup();
        let owner = actor(1, Role::Shipper);

        let a = place_bid(&state, &actor(10, Role::Carrier), offer(load.id, 1.0)).await.unwrap();
        let b = place_bid(&state, &actor(11, Role::Carrier), offer(load.id, 2.0)).await.unwrap();

        accept_bid(&state, &owner, a.id).await.unwrap();
        let second = accept_bid(&state, &owner, b.id).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let confirmed = state
            .bids
            .iter()
            .filter(|e| e.load_id == load.id && e.status == BidStatus::Confirmed)
            .count();
        assert_eq!(confirmed, 1);
        assert_eq!(state.bookings.len(), 1);
    }

    #[tokio::test]
    async fn bids_on_booked_load_are_refused() {
        let (state, _rx, load) = setup();
        let owner = actor(1, Role::Shipper);

        let a = place_bid(&state, &actor(10, Role::Carrier), offer(load.id, 1.0)).await.unwrap();
        accept_bid(&state, &owner, a.id).await.unwrap();

        let late = place_bid(&state, &actor(12, Role::Carrier), offer(load.id, 1.0)).await;
        assert!(matches!(late, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn only_owner_or_admin_decides() {
        let (state, _rx, load) = setup();
        let bid = place_bid(&state, &actor(10, Role::Carrier), offer(load.id, 1.0)).await.unwrap();

        let stranger = actor(99, Role::Shipper);
        assert!(matches!(
            reject_bid(&state, &stranger, bid.id, None).await,
            Err(AppError::Forbidden(_))
        ));

        let admin = actor(100, Role::Admin);
        let rejected = reject_bid(&state, &admin, bid.id, Some("price too high".to_string()))
            .await
            .unwrap();
        assert_eq!(rejected.status, BidStatus::Rejected);
    }
}
