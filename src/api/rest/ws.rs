use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Browsers cannot set headers on a websocket handshake, so the bearer
/// token travels in the query string.
#[derive(Deserialize)]
pub struct WsAuth {
    pub token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(auth): Query<WsAuth>,
) -> Result<impl IntoResponse, AppError> {
    let actor = state.verifier.verify(&auth.token)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, actor.id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let mut feed = Box::pin(
        BroadcastStream::new(state.notification_tx.subscribe()).filter_map(
            move |result| async move {
                match result {
                    Ok(notification) if notification.recipient_id == user_id => {
                        Some(notification)
                    }
                    Ok(_) => None,
                    Err(err) => {
                        warn!(error = %err, "notification feed lagged");
                        None
                    }
                }
            },
        ),
    );

    info!(user_id = %user_id, "websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(notification) = feed.next().await {
            let json = match serde_json::to_string(&notification) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize notification for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!(user_id = %user_id, "websocket client disconnected");
}
