#![allow(dead_code)]

use std::sync::Arc;

use chess_core::{Move, TeamColor};
use server::auth::jwt::{create_token, JwtVerifier};
use server::auth::SharedVerifier;
use server::hub::{ChannelConnection, Connection, GameHub, Outbound, ServerMessage};
use server::routes;
use server::store::{GameId, GameStore, MemoryGameStore};
use tokio::sync::mpsc::UnboundedReceiver;

pub const SECRET: &str = "test-secret";

/// A hub backed by a fresh in-memory store.
pub fn hub() -> (Arc<GameHub>, Arc<dyn GameStore>) {
    let store: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
    (Arc::new(GameHub::new(store.clone())), store)
}

/// Create a game with `white` and `black` already seated.
pub async fn seated_game(hub: &GameHub, white: &str, black: &str) -> GameId {
    let game_id = hub.store().create("test game").unwrap();
    hub.claim_seat(game_id, white, TeamColor::White).await.unwrap();
    hub.claim_seat(game_id, black, TeamColor::Black).await.unwrap();
    game_id
}

pub fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

pub fn token(username: &str) -> String {
    create_token(username, SECRET, 1).unwrap()
}

/// One participant's end of a connection.
pub struct Client {
    pub conn: Arc<ChannelConnection>,
    pub rx: UnboundedReceiver<Outbound>,
}

impl Client {
    pub fn new() -> Self {
        let (conn, rx) = ChannelConnection::new();
        Self {
            conn: Arc::new(conn),
            rx,
        }
    }

    pub fn handle(&self) -> Arc<dyn Connection> {
        self.conn.clone()
    }

    /// Everything queued so far, including close frames.
    pub fn frames(&mut self) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Queued messages, ignoring close frames.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                Outbound::Message(m) => Some(m),
                Outbound::Close => None,
            })
            .collect()
    }

    pub fn notifications(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::Notification { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

pub fn is_snapshot(message: &ServerMessage) -> bool {
    matches!(message, ServerMessage::StateSnapshot { .. })
}

/// Start the HTTP/WebSocket app on an ephemeral port and return its base URL.
pub async fn spawn_server() -> (String, Arc<GameHub>) {
    let (hub, _store) = hub();
    let verifier: SharedVerifier = Arc::new(JwtVerifier::new(SECRET));
    let app = routes::app(hub.clone(), verifier);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), hub)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
