//! Session hub: serializes commands per game, applies them to the rules
//! engine, persists the result and fans it out to the game's connections.
//!
//! Each game id gets its own async mutex guarding its [`Room`]. Everything a
//! command does (load, validate, mutate, save, send) happens while that lock
//! is held, so two commands for the same game never interleave while
//! different games proceed independently.

pub mod connection;
pub mod message;
pub mod room;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chess_core::{ChessError, Move, TeamColor};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

pub use connection::{ChannelConnection, Connection, ConnectionClosed, ConnectionId, Outbound};
pub use message::{ClientCommand, Command, GameSnapshot, Role, ServerMessage};
pub use room::Room;

use crate::auth::{AuthError, Identity};
use crate::store::{GameId, GameRecord, GameStore, StoreError};

/// Why a single command was rejected. The text is what the submitter sees.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidFormat(String),

    #[error("Illegal move {mv}: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },

    #[error("You are not seated as {0} in this game")]
    WrongSeat(TeamColor),

    #[error("You are observing this game")]
    NotASeat,

    #[error("It is not your turn")]
    OutOfTurn,

    #[error("The game is already over")]
    GameOver,

    #[error("The {0} seat is already taken")]
    SeatTaken(TeamColor),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ChessError> for CommandError {
    fn from(e: ChessError) -> Self {
        match e {
            ChessError::InvalidFormat(what) => CommandError::InvalidFormat(what),
            ChessError::IllegalMove { mv, reason } => CommandError::IllegalMove { mv, reason },
        }
    }
}

impl From<AuthError> for CommandError {
    fn from(_: AuthError) -> Self {
        CommandError::Unauthorized
    }
}

/// Send `error` to the submitting connection only.
pub fn report_failure(conn: &dyn Connection, error: &CommandError) {
    if let Err(e) = conn.send(ServerMessage::failure(error.to_string())) {
        warn!("Could not report failure: {e}");
    }
}

pub struct GameHub {
    store: Arc<dyn GameStore>,
    rooms: DashMap<GameId, Arc<Mutex<Room>>>,
}

impl GameHub {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            rooms: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Run `command` for `identity`. On failure the error is also reported to
    /// `conn`; nobody else hears about it.
    pub async fn dispatch(
        &self,
        identity: &str,
        command: Command,
        conn: Arc<dyn Connection>,
    ) -> Result<(), CommandError> {
        let result = match command {
            Command::Join { game_id, role } => self.join(game_id, identity, role, conn.clone()).await,
            Command::Move { game_id, mv } => self.make_move(game_id, identity, mv).await,
            Command::Leave { game_id } => self.leave(game_id, identity, conn.clone()).await,
            Command::Resign { game_id } => self.resign(game_id, identity).await,
        };

        if let Err(e) = &result {
            warn!(game_id = command.game_id(), identity, "Command rejected: {e}");
            report_failure(conn.as_ref(), e);
        }
        result
    }

    /// Register `conn` as a player or observer of `game_id`.
    ///
    /// A seat request only succeeds for the identity the store has recorded
    /// in that seat. Everyone else already connected is told about the join;
    /// the joiner gets a full snapshot. An earlier connection for the same
    /// identity is closed.
    pub async fn join(
        &self,
        game_id: GameId,
        identity: &str,
        role: Role,
        conn: Arc<dyn Connection>,
    ) -> Result<(), CommandError> {
        self.ensure_exists(game_id)?;
        let mut room = self.lock_room(game_id).await;
        let record = self.load(game_id)?;

        if let Some(color) = role.seat() {
            if record.seat(color) != Some(identity) {
                return Err(CommandError::WrongSeat(color));
            }
        }

        let conn_id = conn.id();
        if let Some(replaced) = room.register(identity, conn) {
            if replaced.id() != conn_id {
                replaced.close();
            }
        }

        let text = match role.seat() {
            Some(color) => format!("{identity} joined the game as {color}"),
            None => format!("{identity} joined the game as an observer"),
        };
        room.broadcast(game_id, &ServerMessage::notification(text), Some(identity));
        room.send_to(game_id, identity, ServerMessage::snapshot(&record));

        info!(game_id, identity, ?role, "Joined game");
        Ok(())
    }

    pub async fn make_move(&self, game_id: GameId, identity: &str, mv: Move) -> Result<(), CommandError> {
        self.ensure_exists(game_id)?;
        let mut room = self.lock_room(game_id).await;
        let mut record = self.load(game_id)?;

        let team = record.team_of(identity).ok_or(CommandError::NotASeat)?;
        if record.finished {
            return Err(CommandError::GameOver);
        }
        if record.game.turn() != team {
            return Err(CommandError::OutOfTurn);
        }

        record.game.make_move(mv)?;

        let opponent = team.opponent();
        let text = if record.game.is_in_checkmate(opponent) {
            record.finished = true;
            format!("Checkmate! {identity} wins!")
        } else if record.game.is_in_stalemate(opponent) {
            record.finished = true;
            format!("Stalemate! {identity} moved {mv} and {opponent} has no legal moves")
        } else if record.game.is_in_check(opponent) {
            format!("Check! {identity} moved {mv} and put {opponent} in check")
        } else {
            format!("{identity} moved {mv}")
        };

        self.store.save(&record)?;
        info!(game_id, identity, %mv, finished = record.finished, "Move accepted");

        room.broadcast(game_id, &ServerMessage::notification(text), Some(identity));
        room.broadcast(game_id, &ServerMessage::snapshot(&record), None);
        Ok(())
    }

    /// Give up any seat held by `identity`, drop `conn` from the game and tell
    /// the rest.
    ///
    /// Only `conn` itself is deregistered and closed; another socket bound to
    /// the same identity is left alone. A leave that neither vacates a seat
    /// nor removes a connection changes nothing and announces nothing.
    pub async fn leave(
        &self,
        game_id: GameId,
        identity: &str,
        conn: Arc<dyn Connection>,
    ) -> Result<(), CommandError> {
        self.ensure_exists(game_id)?;
        let mut room = self.lock_room(game_id).await;
        let mut record = self.load(game_id)?;

        let vacated = record.vacate(identity);
        if vacated {
            self.store.save(&record)?;
        }

        let deregistered = room.deregister_connection(identity, conn.id());
        if !vacated && !deregistered {
            return Ok(());
        }

        room.broadcast(
            game_id,
            &ServerMessage::notification(format!("{identity} left the game")),
            None,
        );
        if deregistered {
            conn.close();
        }
        info!(game_id, identity, vacated, "Left game");
        Ok(())
    }

    pub async fn resign(&self, game_id: GameId, identity: &str) -> Result<(), CommandError> {
        self.ensure_exists(game_id)?;
        let mut room = self.lock_room(game_id).await;
        let mut record = self.load(game_id)?;

        if record.finished {
            return Err(CommandError::GameOver);
        }
        let team = record.team_of(identity).ok_or(CommandError::NotASeat)?;

        record.finished = true;
        self.store.save(&record)?;

        let winner = record
            .seat(team.opponent())
            .map(str::to_string)
            .unwrap_or_else(|| team.opponent().to_string());
        room.broadcast(
            game_id,
            &ServerMessage::notification(format!("{identity} resigned. {winner} wins!")),
            None,
        );

        info!(game_id, identity, "Resigned");
        Ok(())
    }

    /// Record `identity` as the occupant of `color`. Reclaiming one's own seat
    /// is a no-op.
    pub async fn claim_seat(
        &self,
        game_id: GameId,
        identity: &str,
        color: TeamColor,
    ) -> Result<GameRecord, CommandError> {
        self.ensure_exists(game_id)?;
        let _room = self.lock_room(game_id).await;
        let mut record = self.load(game_id)?;

        match record.seat(color).map(str::to_string) {
            Some(occupant) if occupant != identity => return Err(CommandError::SeatTaken(color)),
            Some(_) => return Ok(record),
            None => {}
        }

        record.set_seat(color, Some(identity.to_string()));
        self.store.save(&record)?;
        info!(game_id, identity, %color, "Seat claimed");
        Ok(record)
    }

    /// Forget a connection whose transport went away. Seats are kept.
    pub async fn disconnect(&self, game_id: GameId, identity: &str, conn_id: ConnectionId) {
        let mut room = self.lock_room(game_id).await;
        if room.deregister_connection(identity, conn_id) {
            info!(game_id, identity, conn_id, "Connection dropped");
        }
    }

    /// Identities currently connected to `game_id`, sorted.
    pub async fn connected(&self, game_id: GameId) -> Vec<Identity> {
        let Some(room) = self.rooms.get(&game_id).map(|r| Arc::clone(r.value())) else {
            return Vec::new();
        };
        let room = room.lock().await;
        let mut identities = room.identities();
        identities.sort();
        identities
    }

    fn ensure_exists(&self, game_id: GameId) -> Result<(), CommandError> {
        if self.store.exists(game_id)? {
            Ok(())
        } else {
            Err(CommandError::GameNotFound(game_id))
        }
    }

    fn load(&self, game_id: GameId) -> Result<GameRecord, CommandError> {
        self.store
            .load(game_id)?
            .ok_or(CommandError::GameNotFound(game_id))
    }

    async fn lock_room(&self, game_id: GameId) -> RoomGuard<'_> {
        let room = Arc::clone(self.rooms.entry(game_id).or_default().value());
        RoomGuard {
            hub: self,
            game_id,
            room: room.lock_owned().await,
        }
    }
}

/// Exclusive access to one game's room. Releasing it drops the room from the
/// hub when nobody is connected and no other command is waiting on it.
struct RoomGuard<'a> {
    hub: &'a GameHub,
    game_id: GameId,
    room: OwnedMutexGuard<Room>,
}

impl Deref for RoomGuard<'_> {
    type Target = Room;

    fn deref(&self) -> &Room {
        &self.room
    }
}

impl DerefMut for RoomGuard<'_> {
    fn deref_mut(&mut self) -> &mut Room {
        &mut self.room
    }
}

impl Drop for RoomGuard<'_> {
    fn drop(&mut self) {
        if !self.room.is_empty() {
            return;
        }
        // The map and this guard hold the only references; any waiter would add one.
        let held = OwnedMutexGuard::mutex(&self.room);
        self.hub
            .rooms
            .remove_if(&self.game_id, |_, room| Arc::ptr_eq(room, held) && Arc::strong_count(room) == 2);
    }
}
