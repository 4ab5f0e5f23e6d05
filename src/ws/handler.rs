//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaCommand, ArenaHandle, ClientId, PlayerInput};
use crate::util::rate_limit::ClientRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::hub::SessionChannels;
use crate::ws::protocol::{ClientMsg, ServerMsg};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket write failed: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    info!(client_id = %client_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Subscribe before admission so the join notices are not missed
    let channels = state.hub.register(client_id);

    if let Err(e) = state.arena.send(ArenaCommand::Connect(client_id)).await {
        error!(client_id = %client_id, error = %e, "Arena unavailable");
        state.hub.unregister(&client_id);
        return;
    }

    run_session(client_id, ws_sink, ws_stream, channels, &state.arena).await;

    state.hub.unregister(&client_id);
    if let Err(e) = state.arena.send(ArenaCommand::Disconnect(client_id)).await {
        debug!(client_id = %client_id, error = %e, "Disconnect not delivered");
    }

    info!(client_id = %client_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    client_id: ClientId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    channels: SessionChannels,
    arena: &ArenaHandle,
) {
    let rate_limiter = ClientRateLimiter::new();
    let SessionChannels {
        mut direct_rx,
        mut state_rx,
    } = channels;

    // Writer task: direct notices and shared state -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                direct = direct_rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
                shared = state_rx.recv() => match shared {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            client_id = %client_id,
                            lagged_count = n,
                            "Client lagged, skipping {} snapshots", n
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(client_id = %client_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_intent() {
                    warn!(client_id = %client_id, "Rate limited intent message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        let input = PlayerInput {
                            client_id,
                            msg,
                            received_at: unix_millis(),
                        };

                        if arena.send(ArenaCommand::Intent(input)).await.is_err() {
                            debug!(client_id = %client_id, "Arena command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(client_id = %client_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(client_id = %client_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(client_id = %client_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(client_id = %client_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
