use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::events::{emit_event, LifecycleEvent};
use crate::error::AppError;
use crate::models::bid::Bid;
use crate::models::booking::{Booking, BookingStatus, Milestone};
use crate::models::load::{Load, LoadStatus};
use crate::models::user::Actor;
use crate::state::AppState;

pub fn next_milestone(current: Milestone) -> Option<Milestone> {
    match current {
        Milestone::Booked => Some(Milestone::Pickup),
        Milestone::Pickup => Some(Milestone::InTransit),
        Milestone::InTransit => Some(Milestone::Customs),
        Milestone::Customs => Some(Milestone::Delivered),
        Milestone::Delivered => None,
    }
}

pub fn progress_for(milestone: Milestone) -> u8 {
    match milestone {
        Milestone::Booked => 0,
        Milestone::Pickup => 25,
        Milestone::InTransit => 50,
        Milestone::Customs => 75,
        Milestone::Delivered => 100,
    }
}

pub fn status_for(milestone: Milestone) -> BookingStatus {
    match milestone {
        Milestone::Booked => BookingStatus::Confirmed,
        Milestone::Pickup | Milestone::InTransit | Milestone::Customs => BookingStatus::InTransit,
        Milestone::Delivered => BookingStatus::Delivered,
    }
}

/// Materializes the booking for a bid that has just been confirmed.
pub fn open_booking(bid: &Bid, load: &Load) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        bid_id: bid.id,
        load_id: load.id,
        shipper_id: load.shipper_id,
        carrier_id: bid.carrier_id,
        agreed_price: bid.quoted_price,
        currency: bid.currency.clone(),
        status: status_for(Milestone::Booked),
        milestone: Milestone::Booked,
        progress: progress_for(Milestone::Booked),
        created_at: now,
        updated_at: now,
    }
}

/// Moves the booking one milestone forward, keeping status and progress in step.
pub fn advance(booking: &mut Booking) -> Result<Milestone, AppError> {
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "booking {} is cancelled",
            booking.id
        )));
    }

    let next = next_milestone(booking.milestone).ok_or_else(|| {
        AppError::Conflict(format!("booking {} is already delivered", booking.id))
    })?;

    booking.milestone = next;
    booking.status = status_for(next);
    booking.progress = progress_for(next);
    booking.updated_at = Utc::now();
    Ok(next)
}

/// Cancellation is only possible before the cargo has been picked up.
pub fn cancel(booking: &mut Booking) -> Result<(), AppError> {
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "booking {} is already cancelled",
            booking.id
        )));
    }
    if booking.milestone != Milestone::Booked {
        return Err(AppError::Conflict(format!(
            "booking {} is past pickup and can no longer be cancelled",
            booking.id
        )));
    }

    booking.status = BookingStatus::Cancelled;
    booking.updated_at = Utc::now();
    Ok(())
}

pub async fn advance_booking(
    state: &AppState,
    actor: &Actor,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let (booking, previous) = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if !actor.owns_or_admin(booking.carrier_id) {
            return Err(AppError::Forbidden(
                "only the carrier can report shipment progress".to_string(),
            ));
        }

        let previous = booking.milestone;
        advance(&mut booking)?;
        (booking.clone(), previous)
    };

    let gauge = &state.metrics.bookings_by_milestone;
    gauge.with_label_values(&[previous.as_str()]).dec();
    if booking.status == BookingStatus::Delivered {
        set_load_status(state, booking.load_id, LoadStatus::Completed);
    } else {
        gauge.with_label_values(&[booking.milestone.as_str()]).inc();
    }

    info!(
        booking_id = %booking.id,
        milestone = booking.milestone.as_str(),
        progress = booking.progress,
        "booking advanced"
    );

    emit_event(
        state,
        LifecycleEvent::BookingUpdated {
            booking: booking.clone(),
            actor_id: actor.id,
        },
    )
    .await?;

    Ok(booking)
}

pub async fn cancel_booking(
    state: &AppState,
    actor: &Actor,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let booking = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if !(booking.involves(actor.id) || actor.is_admin()) {
            return Err(AppError::Forbidden(
                "only booking participants can cancel it".to_string(),
            ));
        }

        cancel(&mut booking)?;
        booking.clone()
    };

    state
        .metrics
        .bookings_by_milestone
        .with_label_values(&[booking.milestone.as_str()])
        .dec();
    set_load_status(state, booking.load_id, LoadStatus::Cancelled);

    info!(booking_id = %booking.id, actor_id = %actor.id, "booking cancelled");

    emit_event(
        state,
        LifecycleEvent::BookingUpdated {
            booking: booking.clone(),
            actor_id: actor.id,
        },
    )
    .await?;

    Ok(booking)
}

// Called with no booking entry held.
fn set_load_status(state: &AppState, load_id: Uuid, status: LoadStatus) {
    if let Some(mut load) = state.loads.get_mut(&load_id) {
        load.status = status;
        load.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{advance, cancel, open_booking};
    use crate::error::AppError;
    use crate::models::bid::{Bid, BidStatus};
    use crate::models::booking::{BookingStatus, Milestone};
    use crate::models::load::{Load, LoadStatus};

    fn fixtures() -> (Bid, Load) {
        let load = Load {
            id: Uuid::from_u128(1),
            shipper_id: Uuid::from_u128(2),
            origin: "Khunjerab".to_string(),
            destination: "Karachi".to_string(),
            cargo_type: "Textiles".to_string(),
            weight_kg: 8_000.0,
            budget: 300_000.0,
            currency: "PKR".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 11, 6).unwrap(),
            equipment: None,
            notes: None,
            status: LoadStatus::Booked,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let bid = Bid {
            id: Uuid::from_u128(3),
            load_id: load.id,
            shipper_id: load.shipper_id,
            carrier_id: Uuid::from_u128(4),
            quoted_price: 280_000.0,
            currency: "PKR".to_string(),
            estimated_days: 5,
            message: None,
            status: BidStatus::Confirmed,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (bid, load)
    }

    #[test]
    fn new_booking_starts_confirmed_at_zero() {
        let (bid, load) = fixtures();
        let booking = open_booking(&bid, &load);

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.milestone, Milestone::Booked);
        assert_eq!(booking.progress, 0);
        assert_eq!(booking.agreed_price, 280_000.0);
        assert_eq!(booking.shipper_id, load.shipper_id);
        assert_eq!(booking.carrier_id, bid.carrier_id);
    }

    #[test]
    fn milestones_advance_in_order_until_delivered() {
        let (bid, load) = fixtures();
        let mut booking = open_booking(&bid, &load);

        let expected = [
            (Milestone::Pickup, BookingStatus::InTransit, 25),
            (Milestone::InTransit, BookingStatus::InTransit, 50),
            (Milestone::Customs, BookingStatus::InTransit, 75),
            (Milestone::Delivered, BookingStatus::Delivered, 100),
        ];
        for (milestone, status, progress) in expected {
            assert_eq!(advance(&mut booking).unwrap(), milestone);
            assert_eq!(booking.status, status);
            assert_eq!(booking.progress, progress);
        }

        assert!(matches!(advance(&mut booking), Err(AppError::Conflict(_))));
    }

    #[test]
    fn cancel_only_before_pickup() {
        let (bid, load) = fixtures();

        let mut early = open_booking(&bid, &load);
        cancel(&mut early).unwrap();
        assert_eq!(early.status, BookingStatus::Cancelled);
        assert!(advance(&mut early).is_err());
        assert!(cancel(&mut early).is_err());

        let mut late = open_booking(&bid, &load);
        advance(&mut late).unwrap();
        assert!(matches!(cancel(&mut late), Err(AppError::Conflict(_))));
    }
}
