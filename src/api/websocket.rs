use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::{api::middleware::authenticate, error::AppError, AppState};

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn session_replaced() -> Self {
        Self {
            kind: "session_replaced".to_string(),
            payload: serde_json::json!({
                "reason": "A new login replaced this session"
            }),
        }
    }
}

/// Registry of connected sockets, keyed by user. A user may hold several
/// connections; each gets its own sender.
pub struct NotificationHub {
    clients: RwLock<HashMap<Uuid, Vec<(u64, mpsc::Sender<Notification>)>>>,
    next_conn_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
        }
    }

    pub async fn register(&self, user_id: Uuid, sender: mpsc::Sender<Notification>) -> u64 {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.write().await;
        clients.entry(user_id).or_default().push((conn_id, sender));
        tracing::info!("Socket connected: user {} conn {}", user_id, conn_id);
        conn_id
    }

    pub async fn unregister(&self, user_id: Uuid, conn_id: u64) {
        let mut clients = self.clients.write().await;
        if let Some(senders) = clients.get_mut(&user_id) {
            senders.retain(|(id, _)| *id != conn_id);
            if senders.is_empty() {
                clients.remove(&user_id);
            }
        }
        tracing::info!("Socket disconnected: user {} conn {}", user_id, conn_id);
    }

    pub async fn send_to_user(&self, user_id: Uuid, notification: Notification) {
        let clients = self.clients.read().await;
        if let Some(senders) = clients.get(&user_id) {
            for (_, sender) in senders {
                let _ = sender.send(notification.clone()).await;
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Websocket endpoint. The handshake carries the same bearer token as
/// HTTP requests, either as a `token` query parameter or the
/// Authorization header; a failed check rejects the upgrade.
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = params
        .token
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(AppError::Unauthorized)?;

    let user = authenticate(
        state.store.as_ref(),
        &state.tokens,
        &token,
        None,
        &state.config.server.support_email,
    )
    .await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user.id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Notification>(64);

    let conn_id = state.hub.register(user_id, tx).await;

    // Push notifications out to the socket
    let send_task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&notification) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Drain the incoming side until the client goes away
    let recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.hub.unregister(user_id, conn_id).await;
}
