pub mod bidding;
pub mod booking;
pub mod counts;
pub mod events;
pub mod lifecycle;
pub mod listing;
pub mod notifier;
pub mod validation;
