//! WebSocket transport for live games.
//!
//! Each socket is split: a writer task drains the connection's outbound
//! channel into the socket while this task reads commands, resolves the
//! caller's identity and hands them to the hub.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::auth::{Identity, IdentityVerifier, SharedVerifier};
use crate::hub::{
    report_failure, ChannelConnection, ClientCommand, Command, CommandError, Connection, GameHub,
    Outbound, ServerMessage,
};
use crate::store::GameId;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<Arc<GameHub>>,
    Extension(verifier): Extension<SharedVerifier>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub, verifier))
}

async fn handle_socket(socket: WebSocket, hub: Arc<GameHub>, verifier: SharedVerifier) {
    let (mut sender, mut receiver) = socket.split();
    let (conn, mut outbound) = ChannelConnection::new();
    let conn: Arc<dyn Connection> = Arc::new(conn);

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match frame {
                Outbound::Message(msg) => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to encode message: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Games this socket is registered in, so a dropped socket can be deregistered.
    let mut joined: HashSet<(GameId, Identity)> = HashSet::new();

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };
        debug!(conn_id = conn.id(), "Received: {text}");

        let client_cmd: ClientCommand = match serde_json::from_str(&text) {
            Ok(c) => c,
            Err(e) => {
                let _ = conn.send(ServerMessage::failure(format!("Invalid message: {e}")));
                continue;
            }
        };

        let (identity, command) = match resolve(verifier.as_ref(), client_cmd) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(conn_id = conn.id(), "Command rejected: {e}");
                report_failure(conn.as_ref(), &e);
                continue;
            }
        };

        if hub.dispatch(&identity, command, conn.clone()).await.is_ok() {
            match command {
                Command::Join { game_id, .. } => {
                    joined.insert((game_id, identity));
                }
                Command::Leave { game_id } => {
                    joined.remove(&(game_id, identity));
                }
                _ => {}
            }
        }
    }

    for (game_id, identity) in joined {
        hub.disconnect(game_id, &identity, conn.id()).await;
    }
    conn.close();
    let _ = writer.await;
}

fn resolve(
    verifier: &dyn IdentityVerifier,
    client_cmd: ClientCommand,
) -> Result<(Identity, Command), CommandError> {
    let identity = verifier.resolve(client_cmd.auth_token())?;
    let command = client_cmd.into_command()?;
    Ok((identity, command))
}
