//! Outbound side of a participant's live connection.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;

use super::message::ServerMessage;

pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("connection {0} is closed")]
pub struct ConnectionClosed(pub ConnectionId);

/// What the hub needs from a transport: send a message, ask whether the peer
/// is still there, and hang up.
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;

    fn send(&self, message: ServerMessage) -> Result<(), ConnectionClosed>;

    fn is_open(&self) -> bool;

    fn close(&self);
}

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone)]
pub enum Outbound {
    Message(ServerMessage),
    Close,
}

/// Connection backed by an unbounded channel. The receiving half belongs to
/// whatever writes to the real socket; once it is dropped, sends fail.
#[derive(Debug)]
pub struct ChannelConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Outbound>,
    closed: AtomicBool,
}

impl ChannelConnection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            tx,
            closed: AtomicBool::new(false),
        };
        (conn, rx)
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, message: ServerMessage) -> Result<(), ConnectionClosed> {
        if !self.is_open() {
            return Err(ConnectionClosed(self.id));
        }
        self.tx
            .send(Outbound::Message(message))
            .map_err(|_| ConnectionClosed(self.id))
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(Outbound::Close);
        }
    }
}
