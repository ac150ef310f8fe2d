//! Who is currently connected to one game.
//!
//! A room is a cache of live connections, rebuilt from scratch on restart.
//! Seating lives in the store. Send failures are logged and the dead
//! connection is pruned; they never fail the command that triggered them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::auth::Identity;
use crate::store::GameId;

use super::connection::{Connection, ConnectionClosed, ConnectionId};
use super::message::ServerMessage;

#[derive(Default)]
pub struct Room {
    sessions: HashMap<Identity, Arc<dyn Connection>>,
}

impl Room {
    /// Register `conn` for `identity`, returning any connection it replaces.
    pub fn register(&mut self, identity: &str, conn: Arc<dyn Connection>) -> Option<Arc<dyn Connection>> {
        self.sessions.insert(identity.to_string(), conn)
    }

    /// Remove `identity` only if it is still bound to connection `conn_id`.
    pub fn deregister_connection(&mut self, identity: &str, conn_id: ConnectionId) -> bool {
        match self.sessions.get(identity) {
            Some(conn) if conn.id() == conn_id => {
                self.sessions.remove(identity);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn send_to(&mut self, game_id: GameId, identity: &str, message: ServerMessage) {
        let Some(conn) = self.sessions.get(identity) else {
            return;
        };
        if let Err(e) = send_if_open(conn.as_ref(), message) {
            warn!(game_id, identity, "Dropping connection: {e}");
            self.sessions.remove(identity);
        }
    }

    /// Send `message` to every connection except `except`'s.
    pub fn broadcast(&mut self, game_id: GameId, message: &ServerMessage, except: Option<&str>) {
        let mut dead = Vec::new();

        for (identity, conn) in &self.sessions {
            if except == Some(identity.as_str()) {
                continue;
            }
            if let Err(e) = send_if_open(conn.as_ref(), message.clone()) {
                warn!(game_id, identity = %identity, "Dropping connection: {e}");
                dead.push(identity.clone());
            }
        }

        for identity in dead {
            self.sessions.remove(&identity);
        }
    }
}

fn send_if_open(conn: &dyn Connection, message: ServerMessage) -> Result<(), ConnectionClosed> {
    if !conn.is_open() {
        return Err(ConnectionClosed(conn.id()));
    }
    conn.send(message)
}
