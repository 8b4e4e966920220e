use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::Notification;
use crate::models::user::Actor;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).patch(mark_all_read),
        )
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/notifications/:id/read", post(mark_read))
}

#[derive(Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize)]
pub struct NotificationList {
    pub data: Vec<Notification>,
    pub total: usize,
    pub unread: usize,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(filter): Query<NotificationFilter>,
) -> Json<NotificationList> {
    let mut data: Vec<Notification> = state
        .notifications
        .iter()
        .filter(|entry| entry.recipient_id == actor.id)
        .map(|entry| entry.value().clone())
        .collect();
    data.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    let unread = data.iter().filter(|n| !n.read).count();
    if filter.unread_only {
        data.retain(|n| !n.read);
    }

    Json(NotificationList {
        total: data.len(),
        data,
        unread,
    })
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<Notification>, AppError> {
    // Other users' notifications are reported as missing.
    let mut notification = state
        .notifications
        .get_mut(&id)
        .filter(|n| n.recipient_id == actor.id)
        .ok_or_else(|| AppError::NotFound(format!("notification {} not found", id)))?;

    notification.read = true;
    Ok(Json(notification.clone()))
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<MarkAllReadResponse> {
    let mut updated = 0;
    for mut entry in state.notifications.iter_mut() {
        let notification = entry.value_mut();
        if notification.recipient_id == actor.id && !notification.read {
            notification.read = true;
            updated += 1;
        }
    }

    Json(MarkAllReadResponse { updated })
}

async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<StatusCode, AppError> {
    state
        .notifications
        .remove_if(&id, |_, n| n.recipient_id == actor.id)
        .ok_or_else(|| AppError::NotFound(format!("notification {} not found", id)))?;

    Ok(StatusCode::NO_CONTENT)
}
