use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::loads::BidFilter;
use crate::api::rest::{ListResponse, Payload};
use crate::engine::bidding::{accept_bid, place_bid, reject_bid, withdraw_bid, NewBid};
use crate::engine::counts::bid_counts;
use crate::engine::validation::{non_blank, Violations};
use crate::error::AppError;
use crate::models::bid::Bid;
use crate::models::booking::Booking;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quotes", post(create_quote).get(list_my_quotes))
        .route("/api/quotes/:id", get(get_quote))
        .route("/api/quotes/:id/withdraw", post(withdraw_quote))
        .route("/api/quotes/:id/accept", post(accept_quote))
        .route("/api/quotes/:id/reject", post(reject_quote))
}

#[derive(Deserialize)]
pub struct CreateQuoteRequest {
    pub load_id: Option<Uuid>,
    pub quoted_price: Option<f64>,
    pub estimated_days: Option<i64>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct WithdrawRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct AcceptResponse {
    pub bid: Bid,
    pub booking: Booking,
}

fn validate_quote(payload: CreateQuoteRequest) -> Result<NewBid, AppError> {
    let mut violations = Violations::new();

    let load_id = violations.require("load_id", payload.load_id);
    let quoted_price = violations.require_positive("quoted_price", payload.quoted_price);
    let estimated_days = violations.require("estimated_days", payload.estimated_days);
    if let Some(days) = estimated_days {
        violations.check(
            days >= 1 && days <= i64::from(u32::MAX),
            "estimated_days must be a positive whole number",
        );
    }

    violations.finish()?;

    match (load_id, quoted_price, estimated_days) {
        (Some(load_id), Some(quoted_price), Some(days)) => Ok(NewBid {
            load_id,
            quoted_price,
            estimated_days: u32::try_from(days)
                .map_err(|err| AppError::Validation(format!("estimated_days: {err}")))?,
            message: non_blank(payload.message),
        }),
        _ => Err(AppError::Internal("quote validation lost a field".to_string())),
    }
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<CreateQuoteRequest>,
) -> Result<Json<Bid>, AppError> {
    let new_bid = validate_quote(payload)?;
    let bid = place_bid(&state, &actor, new_bid).await?;
    Ok(Json(bid))
}

/// Bids the caller placed (carriers) or received (shippers); admins see all.
async fn list_my_quotes(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(filter): Query<BidFilter>,
) -> Json<ListResponse<Bid>> {
    let mut bids: Vec<Bid> = state
        .bids
        .iter()
        .filter(|entry| match actor.role {
            Role::Carrier => entry.carrier_id == actor.id,
            Role::Shipper => entry.shipper_id == actor.id,
            Role::Admin => true,
        })
        .map(|entry| entry.value().clone())
        .collect();
    bids.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    let counts = bid_counts(&bids);
    if let Some(status) = filter.status {
        bids.retain(|bid| bid.status == status);
    }

    Json(ListResponse::new(bids).with_counts(counts))
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Bid>, AppError> {
    let bid = state
        .bids
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("bid {} not found", id)))?;

    let visible = actor.is_admin() || bid.carrier_id == actor.id || bid.shipper_id == actor.id;
    if !visible {
        return Err(AppError::NotFound(format!("bid {} not found", id)));
    }

    Ok(Json(bid))
}

async fn withdraw_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<WithdrawRequest>,
) -> Result<Json<Bid>, AppError> {
    let bid = withdraw_bid(&state, &actor, id, &payload.reason).await?;
    Ok(Json(bid))
}

async fn accept_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<AcceptResponse>, AppError> {
    let (bid, booking) = accept_bid(&state, &actor, id).await?;
    Ok(Json(AcceptResponse { bid, booking }))
}

async fn reject_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    payload: Option<Json<RejectRequest>>,
) -> Result<Json<Bid>, AppError> {
    let reason = payload.and_then(|Json(body)| non_blank(body.reason));
    let bid = reject_bid(&state, &actor, id, reason).await?;
    Ok(Json(bid))
}
