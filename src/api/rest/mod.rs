pub mod bookings;
pub mod loads;
pub mod market_requests;
pub mod notifications;
pub mod quotes;
pub mod vehicles;
pub mod ws;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::engine::counts::StatusCounts;
use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(loads::router())
        .merge(quotes::router())
        .merge(bookings::router())
        .merge(vehicles::router())
        .merge(market_requests::router())
        .merge(notifications::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Shape shared by every collection endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<StatusCounts>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            total: data.len(),
            data,
            counts: None,
        }
    }

    pub fn with_counts(mut self, counts: StatusCounts) -> Self {
        self.counts = Some(counts);
        self
    }
}

/// JSON request body whose rejections use the `{ "error": ... }` shape.
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Payload(value))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    loads: usize,
    bids: usize,
    bookings: usize,
    trucks: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        loads: state.loads.len(),
        bids: state.bids.len(),
        bookings: state.bookings.len(),
        trucks: state.trucks.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
