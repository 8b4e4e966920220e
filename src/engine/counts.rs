use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::bid::{Bid, BidStatus};
use crate::models::booking::{Booking, BookingStatus};

const BID_STATUSES: [BidStatus; 4] = [
    BidStatus::Pending,
    BidStatus::Confirmed,
    BidStatus::Cancelled,
    BidStatus::Rejected,
];

const BOOKING_STATUSES: [BookingStatus; 5] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::InTransit,
    BookingStatus::Delivered,
    BookingStatus::Cancelled,
];

/// Per-status tallies plus an `all` entry. Every known status is present,
/// zero or not, so clients can render tab labels without special cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<&'static str, usize>);

impl StatusCounts {
    fn with_keys(keys: impl IntoIterator<Item = &'static str>) -> Self {
        let mut counts = BTreeMap::new();
        counts.insert("all", 0);
        for key in keys {
            counts.insert(key, 0);
        }
        Self(counts)
    }

    fn bump(&mut self, key: &'static str) {
        *self.0.entry(key).or_insert(0) += 1;
        *self.0.entry("all").or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }
}

/// Tallies must be taken over the caller's complete collection, before any
/// status filter narrows what is returned.
pub fn bid_counts<'a>(bids: impl IntoIterator<Item = &'a Bid>) -> StatusCounts {
    let mut counts = StatusCounts::with_keys(BID_STATUSES.iter().map(|s| s.as_str()));
    for bid in bids {
        counts.bump(bid.status.as_str());
    }
    counts
}

pub fn booking_counts<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> StatusCounts {
    let mut counts = StatusCounts::with_keys(BOOKING_STATUSES.iter().map(|s| s.as_str()));
    for booking in bookings {
        counts.bump(booking.status.as_str());
    }
    counts
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{bid_counts, booking_counts};
    use crate::models::bid::{Bid, BidStatus};
    use crate::models::booking::{Booking, BookingStatus, Milestone};

    fn bid(status: BidStatus) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            load_id: Uuid::from_u128(7),
            shipper_id: Uuid::from_u128(1),
            carrier_id: Uuid::new_v4(),
            quoted_price: 100_000.0,
            currency: "PKR".to_string(),
            estimated_days: 3,
            message: None,
            status,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn counts_cover_the_whole_fixture() {
        let bids = vec![
            bid(BidStatus::Pending),
            bid(BidStatus::Pending),
            bid(BidStatus::Confirmed),
            bid(BidStatus::Rejected),
        ];

        let counts = bid_counts(&bids);
        assert_eq!(counts.get("all"), 4);
        assert_eq!(counts.get("pending"), 2);
        assert_eq!(counts.get("confirmed"), 1);
        assert_eq!(counts.get("rejected"), 1);
        assert_eq!(counts.get("cancelled"), 0);
    }

    #[test]
    fn counts_ignore_a_later_filter() {
        let bids = vec![
            bid(BidStatus::Pending),
            bid(BidStatus::Pending),
            bid(BidStatus::Confirmed),
            bid(BidStatus::Rejected),
        ];

        let counts = bid_counts(&bids);
        let shown: Vec<&Bid> = bids
            .iter()
            .filter(|b| b.status == BidStatus::Confirmed)
            .collect();

        assert_eq!(shown.len(), 1);
        assert_eq!(counts.get("all"), 4);
        assert_eq!(counts.get("pending"), 2);
    }

    #[test]
    fn empty_collection_reports_zeroes() {
        let counts = bid_counts(std::iter::empty());
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["all"], 0);
        assert_eq!(json["pending"], 0);
        assert_eq!(json["cancelled"], 0);
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            bid_id: Uuid::new_v4(),
            load_id: Uuid::new_v4(),
            shipper_id: Uuid::from_u128(1),
            carrier_id: Uuid::from_u128(2),
            agreed_price: 300_000.0,
            currency: "PKR".to_string(),
            status,
            milestone: Milestone::Booked,
            progress: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn booking_counts_use_wire_status_names() {
        let bookings = vec![
            booking(BookingStatus::InTransit),
            booking(BookingStatus::InTransit),
            booking(BookingStatus::Delivered),
        ];

        let counts = booking_counts(&bookings);
        assert_eq!(counts.get("all"), 3);
        assert_eq!(counts.get("in_transit"), 2);
        assert_eq!(counts.get("delivered"), 1);
        assert_eq!(counts.get("pending"), 0);
    }

    #[test]
    fn booking_status_keys_match_serialized_names() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InTransit,
            BookingStatus::Delivered,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
    }
}
