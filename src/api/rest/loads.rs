use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::require_role;
use crate::api::rest::{ListResponse, Payload};
use crate::engine::bidding::supersede_siblings;
use crate::engine::counts::bid_counts;
use crate::engine::events::{emit_all, LifecycleEvent};
use crate::engine::listing::{select_loads, LoadQuery};
use crate::engine::validation::validate_load;
use crate::error::AppError;
use crate::models::bid::{Bid, BidStatus};
use crate::models::load::{Load, LoadDraft, LoadPatch, LoadStatus};
use crate::models::user::{Actor, Role};
use crate::state::AppState;

const WITHDRAWN_LOAD_REASON: &str = "Load was withdrawn by the shipper";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v2/loads", post(create_load).get(list_loads))
        .route(
            "/api/v2/loads/:id",
            get(get_load).patch(update_load).delete(delete_load),
        )
        .route("/api/v2/loads/:id/cancel", post(cancel_load))
        .route("/api/v2/loads/:id/bids", get(list_load_bids))
}

#[derive(Debug, Default, Deserialize)]
pub struct BidFilter {
    pub status: Option<BidStatus>,
}

async fn create_load(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<LoadDraft>,
) -> Result<Json<Load>, AppError> {
    require_role(&actor, Role::Shipper, "post loads")?;
    let valid = validate_load(payload)?;

    let now = Utc::now();
    let load = Load {
        id: Uuid::new_v4(),
        shipper_id: actor.id,
        origin: valid.origin,
        destination: valid.destination,
        cargo_type: valid.cargo_type,
        weight_kg: valid.weight_kg,
        budget: valid.budget,
        currency: valid.currency,
        pickup_date: valid.pickup_date,
        delivery_date: valid.delivery_date,
        equipment: valid.equipment,
        notes: valid.notes,
        status: LoadStatus::Available,
        created_at: now,
        updated_at: now,
    };

    state.loads.insert(load.id, load.clone());
    info!(load_id = %load.id, shipper_id = %actor.id, origin = %load.origin, destination = %load.destination, "load posted");

    Ok(Json(load))
}

async fn list_loads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoadQuery>,
) -> Json<ListResponse<Load>> {
    let loads = state.loads.iter().map(|entry| entry.value().clone());
    Json(ListResponse::new(select_loads(loads, &query)))
}

async fn get_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Load>, AppError> {
    let load = state
        .loads
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("load {} not found", id)))?;

    Ok(Json(load.value().clone()))
}

async fn update_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<LoadPatch>,
) -> Result<Json<Load>, AppError> {
    let mut load = state
        .loads
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("load {} not found", id)))?;

    ensure_editable(&load, &actor)?;

    let valid = validate_load(load.to_draft().apply(payload))?;
    load.origin = valid.origin;
    load.destination = valid.destination;
    load.cargo_type = valid.cargo_type;
    load.weight_kg = valid.weight_kg;
    load.budget = valid.budget;
    load.currency = valid.currency;
    load.pickup_date = valid.pickup_date;
    load.delivery_date = valid.delivery_date;
    load.equipment = valid.equipment;
    load.notes = valid.notes;
    load.updated_at = Utc::now();

    info!(load_id = %id, "load updated");
    Ok(Json(load.clone()))
}

async fn delete_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<StatusCode, AppError> {
    let (_, events) = close_load(&state, &actor, id)?;
    state.loads.remove(&id);

    info!(load_id = %id, rejected_bids = events.len(), "load deleted");
    emit_all(&state, events).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Load>, AppError> {
    let (load, events) = close_load(&state, &actor, id)?;

    info!(load_id = %id, rejected_bids = events.len(), "load cancelled");
    emit_all(&state, events).await?;

    Ok(Json(load))
}

/// Takes an available load off the market and rejects its pending bids.
fn close_load(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> Result<(Load, Vec<LifecycleEvent>), AppError> {
    let mut load = state
        .loads
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("load {} not found", id)))?;

    ensure_editable(&load, actor)?;

    let events = supersede_siblings(state, id, None, WITHDRAWN_LOAD_REASON);
    load.status = LoadStatus::Cancelled;
    load.updated_at = Utc::now();

    Ok((load.clone(), events))
}

fn ensure_editable(load: &Load, actor: &Actor) -> Result<(), AppError> {
    if load.shipper_id != actor.id {
        return Err(AppError::Forbidden(
            "only the shipper who posted a load can change it".to_string(),
        ));
    }
    if load.status != LoadStatus::Available {
        return Err(AppError::Conflict(format!(
            "load {} can only be changed while available",
            load.id
        )));
    }
    Ok(())
}

async fn list_load_bids(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Query(filter): Query<BidFilter>,
) -> Result<Json<ListResponse<Bid>>, AppError> {
    let owner = state
        .loads
        .get(&id)
        .map(|load| load.shipper_id)
        .ok_or_else(|| AppError::NotFound(format!("load {} not found", id)))?;

    if !actor.owns_or_admin(owner) {
        return Err(AppError::Forbidden(
            "only the load owner can see its bids".to_string(),
        ));
    }

    let mut bids: Vec<Bid> = state
        .bids
        .iter()
        .filter(|entry| entry.load_id == id)
        .map(|entry| entry.value().clone())
        .collect();
    bids.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let counts = bid_counts(&bids);
    if let Some(status) = filter.status {
        bids.retain(|bid| bid.status == status);
    }

    Ok(Json(ListResponse::new(bids).with_counts(counts)))
}
