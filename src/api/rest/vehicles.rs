use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::require_role;
use crate::api::rest::{ListResponse, Payload};
use crate::engine::events::{emit_event, LifecycleEvent};
use crate::engine::listing::{select_trucks, TruckQuery};
use crate::engine::validation::{non_blank, Violations};
use crate::error::AppError;
use crate::models::truck::{QuoteRequest, QuoteRequestStatus, Truck};
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/vehicles", post(create_truck).get(list_trucks))
        .route("/api/vehicles/:id", get(get_truck))
        .route("/api/vehicles/:id/verification", patch(update_verification))
        .route("/api/vehicles/:id/availability", patch(update_availability))
        .route("/api/vehicles/:id/quote-requests", post(request_quote))
        .route("/api/quote-requests", get(list_quote_requests))
        .route("/api/quote-requests/:id/respond", post(respond_to_quote_request))
}

#[derive(Deserialize)]
pub struct CreateTruckRequest {
    #[serde(default)]
    pub registration: String,
    #[serde(default)]
    pub truck_type: String,
    pub capacity_kg: Option<f64>,
    pub rate_per_km: Option<f64>,
    #[serde(default)]
    pub home_city: String,
}

#[derive(Deserialize)]
pub struct VerificationRequest {
    pub verified: bool,
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Deserialize)]
pub struct QuoteRequestPayload {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub cargo_type: String,
    pub weight_kg: Option<f64>,
    pub pickup_date: Option<NaiveDate>,
    pub message: Option<String>,
}

/// `quoted_price` answers the request; leaving it out declines it.
#[derive(Deserialize)]
pub struct QuoteResponsePayload {
    pub quoted_price: Option<f64>,
}

async fn create_truck(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<CreateTruckRequest>,
) -> Result<Json<Truck>, AppError> {
    require_role(&actor, Role::Carrier, "register trucks")?;

    let mut violations = Violations::new();
    violations.require_text("registration", &payload.registration);
    violations.require_text("truck_type", &payload.truck_type);
    violations.require_text("home_city", &payload.home_city);
    let capacity_kg = violations.require_positive("capacity_kg", payload.capacity_kg);
    let rate_per_km = violations.require_positive("rate_per_km", payload.rate_per_km);
    violations.finish()?;

    let (Some(capacity_kg), Some(rate_per_km)) = (capacity_kg, rate_per_km) else {
        return Err(AppError::Internal("truck validation lost a field".to_string()));
    };

    let truck = Truck {
        id: Uuid::new_v4(),
        carrier_id: actor.id,
        registration: payload.registration.trim().to_uppercase(),
        truck_type: payload.truck_type.trim().to_lowercase(),
        capacity_kg,
        rate_per_km,
        home_city: payload.home_city.trim().to_string(),
        verified: false,
        available: true,
        created_at: Utc::now(),
    };

    state.trucks.insert(truck.id, truck.clone());
    info!(truck_id = %truck.id, carrier_id = %actor.id, "truck registered");

    Ok(Json(truck))
}

async fn list_trucks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TruckQuery>,
) -> Json<ListResponse<Truck>> {
    let trucks = state.trucks.iter().map(|entry| entry.value().clone());
    Json(ListResponse::new(select_trucks(trucks, &query)))
}

async fn get_truck(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Truck>, AppError> {
    let truck = state
        .trucks
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("truck {} not found", id)))?;

    Ok(Json(truck.value().clone()))
}

async fn update_verification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<VerificationRequest>,
) -> Result<Json<Truck>, AppError> {
    require_role(&actor, Role::Admin, "verify trucks")?;

    let mut truck = state
        .trucks
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("truck {} not found", id)))?;

    truck.verified = payload.verified;
    info!(truck_id = %id, verified = payload.verified, "truck verification changed");

    Ok(Json(truck.clone()))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<AvailabilityRequest>,
) -> Result<Json<Truck>, AppError> {
    let mut truck = state
        .trucks
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("truck {} not found", id)))?;

    if !actor.owns_or_admin(truck.carrier_id) {
        return Err(AppError::Forbidden(
            "only the truck owner can change its availability".to_string(),
        ));
    }

    truck.available = payload.available;
    Ok(Json(truck.clone()))
}

async fn request_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<QuoteRequestPayload>,
) -> Result<Json<QuoteRequest>, AppError> {
    require_role(&actor, Role::Shipper, "request quotes")?;

    let carrier_id = {
        let truck = state
            .trucks
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("truck {} not found", id)))?;
        if !truck.available {
            return Err(AppError::Validation(format!(
                "truck {} is not taking requests",
                id
            )));
        }
        truck.carrier_id
    };

    let mut violations = Violations::new();
    violations.require_text("origin", &payload.origin);
    violations.require_text("destination", &payload.destination);
    violations.require_text("cargo_type", &payload.cargo_type);
    let weight_kg = violations.require_positive("weight_kg", payload.weight_kg);
    let pickup_date = violations.require("pickup_date", payload.pickup_date);
    violations.finish()?;

    let (Some(weight_kg), Some(pickup_date)) = (weight_kg, pickup_date) else {
        return Err(AppError::Internal("quote request validation lost a field".to_string()));
    };

    let now = Utc::now();
    let request = QuoteRequest {
        id: Uuid::new_v4(),
        truck_id: id,
        shipper_id: actor.id,
        carrier_id,
        origin: payload.origin.trim().to_string(),
        destination: payload.destination.trim().to_string(),
        cargo_type: payload.cargo_type.trim().to_string(),
        weight_kg,
        pickup_date,
        message: non_blank(payload.message),
        status: QuoteRequestStatus::Pending,
        quoted_price: None,
        created_at: now,
        updated_at: now,
    };

    state.quote_requests.insert(request.id, request.clone());
    info!(request_id = %request.id, truck_id = %id, shipper_id = %actor.id, "quote requested");

    emit_event(
        &state,
        LifecycleEvent::QuoteRequested {
            request: request.clone(),
        },
    )
    .await?;

    Ok(Json(request))
}

async fn list_quote_requests(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<ListResponse<QuoteRequest>> {
    let mut requests: Vec<QuoteRequest> = state
        .quote_requests
        .iter()
        .filter(|entry| {
            actor.is_admin() || entry.shipper_id == actor.id || entry.carrier_id == actor.id
        })
        .map(|entry| entry.value().clone())
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    Json(ListResponse::new(requests))
}

async fn respond_to_quote_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Payload(payload): Payload<QuoteResponsePayload>,
) -> Result<Json<QuoteRequest>, AppError> {
    if let Some(price) = payload.quoted_price {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::Validation("quoted_price must be > 0".to_string()));
        }
    }

    let request = {
        let mut request = state
            .quote_requests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("quote request {} not found", id)))?;

        if request.carrier_id != actor.id {
            return Err(AppError::Forbidden(
                "only the truck owner can answer a quote request".to_string(),
            ));
        }
        if request.status != QuoteRequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "quote request {} was already answered",
                id
            )));
        }

        request.status = match payload.quoted_price {
            Some(_) => QuoteRequestStatus::Quoted,
            None => QuoteRequestStatus::Declined,
        };
        request.quoted_price = payload.quoted_price;
        request.updated_at = Utc::now();
        request.clone()
    };

    emit_event(
        &state,
        LifecycleEvent::QuoteAnswered {
            request: request.clone(),
        },
    )
    .await?;

    Ok(Json(request))
}
