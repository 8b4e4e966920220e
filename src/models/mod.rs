pub mod bid;
pub mod booking;
pub mod load;
pub mod market_request;
pub mod notification;
pub mod truck;
pub mod user;
