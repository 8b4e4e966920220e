use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::ListResponse;
use crate::engine::booking::{advance_booking, cancel_booking};
use crate::engine::counts::booking_counts;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::user::Actor;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bookings", get(list_bookings))
        .route("/api/bookings/:id", get(get_booking))
        .route("/api/bookings/:id/advance", post(advance))
        .route("/api/bookings/:id/cancel", post(cancel))
}

#[derive(Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(filter): Query<BookingFilter>,
) -> Json<ListResponse<Booking>> {
    let mut bookings: Vec<Booking> = state
        .bookings
        .iter()
        .filter(|entry| actor.is_admin() || entry.involves(actor.id))
        .map(|entry| entry.value().clone())
        .collect();
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    let counts = booking_counts(&bookings);
    if let Some(status) = filter.status {
        bookings.retain(|booking| booking.status == status);
    }

    Json(ListResponse::new(bookings).with_counts(counts))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .filter(|booking| actor.is_admin() || booking.involves(actor.id))
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(Json(booking.value().clone()))
}

async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(advance_booking(&state, &actor, id).await?))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(cancel_booking(&state, &actor, id).await?))
}
