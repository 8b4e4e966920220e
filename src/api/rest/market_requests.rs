use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::{ListResponse, Payload};
use crate::engine::validation::{non_blank, Violations};
use crate::error::AppError;
use crate::models::market_request::{MarketRequest, MarketRequestStatus};
use crate::models::user::Actor;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/market-requests",
            post(create_market_request).get(list_market_requests),
        )
        .route("/api/market-requests/:id/close", post(close_market_request))
}

#[derive(Deserialize)]
pub struct CreateMarketRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub goods_type: String,
    #[serde(default)]
    pub description: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub budget: Option<f64>,
}

async fn create_market_request(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<CreateMarketRequest>,
) -> Result<Json<MarketRequest>, AppError> {
    let mut violations = Violations::new();
    violations.require_text("title", &payload.title);
    violations.require_text("goods_type", &payload.goods_type);
    violations.require_text("description", &payload.description);
    if payload.budget.is_some() {
        violations.require_positive("budget", payload.budget);
    }
    violations.finish()?;

    let request = MarketRequest {
        id: Uuid::new_v4(),
        requester_id: actor.id,
        title: payload.title.trim().to_string(),
        goods_type: payload.goods_type.trim().to_string(),
        description: payload.description.trim().to_string(),
        origin: non_blank(payload.origin),
        destination: non_blank(payload.destination),
        budget: payload.budget,
        status: MarketRequestStatus::Open,
        created_at: Utc::now(),
    };

    state.market_requests.insert(request.id, request.clone());
    info!(request_id = %request.id, requester_id = %actor.id, "market request submitted");

    Ok(Json(request))
}

async fn list_market_requests(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<ListResponse<MarketRequest>> {
    let mut requests: Vec<MarketRequest> = state
        .market_requests
        .iter()
        .filter(|entry| actor.owns_or_admin(entry.requester_id))
        .map(|entry| entry.value().clone())
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    Json(ListResponse::new(requests))
}

async fn close_market_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<MarketRequest>, AppError> {
    let mut request = state
        .market_requests
        .get_mut(&id)
        .filter(|request| actor.owns_or_admin(request.requester_id))
        .ok_or_else(|| AppError::NotFound(format!("market request {} not found", id)))?;

    if request.status == MarketRequestStatus::Closed {
        return Err(AppError::Conflict(format!(
            "market request {} is already closed",
            id
        )));
    }

    request.status = MarketRequestStatus::Closed;
    Ok(Json(request.clone()))
}
