use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dispatch::ServerEvent;
use crate::presence::ConnectionHandle;
use crate::AppState;

const OUTBOUND_BUFFER: usize = 100;

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

// Realtime event stream. Identity comes from the session token only; a
// client cannot connect as an arbitrary user id.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "WebSocket",
    params(
        ("token" = Option<String>, Query, description = "Session token")
    ),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol"),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WebSocketQuery>,
    State(state): State<AppState>,
) -> Result<Response, StatusCode> {
    let Some(token) = params.token else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let (user, _session) = state
        .authenticate(&token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: duplex_auth::User) {
    let (mut ws_sender, mut receiver) = socket.split();
    let connection_id = Uuid::new_v4().to_string();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);
    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize server event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Hello must arrive before any fan-out so the client can start echoing
    // its correlation id immediately.
    let hello = ServerEvent::Hello {
        connection_id: connection_id.clone(),
        user_id: user.public_id.clone(),
    };
    let _ = out_tx.send(hello).await;

    state
        .presence()
        .register(
            &user.public_id,
            ConnectionHandle::new(connection_id.clone(), out_tx.clone()),
        )
        .await;
    tracing::info!(user = %user.public_id, connection_id = %connection_id, "websocket connected");

    // All mutations flow through the REST surface; inbound frames only
    // matter for connection lifecycle.
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(Message::Text(_)) => {
                let _ = out_tx
                    .send(ServerEvent::Error {
                        message: "client events are not accepted on this stream".to_string(),
                    })
                    .await;
            }
            Ok(_) => {}
        }
    }

    state.presence().unregister(&connection_id).await;
    drop(out_tx);
    let _ = sender_task.await;
    tracing::info!(user = %user.public_id, connection_id = %connection_id, "websocket disconnected");
}
