//! Persisted game records.
//!
//! The store is the source of truth for seating. The hub loads a record,
//! works on its `ChessGame`, and writes it back after every accepted change.

pub mod memory;

use chess_core::{ChessGame, TeamColor};
use serde::{Deserialize, Serialize};

pub use memory::MemoryGameStore;

pub type GameId = i64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Game store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: GameId,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub game: ChessGame,
    pub finished: bool,
}

impl GameRecord {
    pub fn new(game_id: GameId, name: impl Into<String>) -> Self {
        Self {
            game_id,
            name: name.into(),
            white: None,
            black: None,
            game: ChessGame::new(),
            finished: false,
        }
    }

    pub fn seat(&self, color: TeamColor) -> Option<&str> {
        match color {
            TeamColor::White => self.white.as_deref(),
            TeamColor::Black => self.black.as_deref(),
        }
    }

    pub fn set_seat(&mut self, color: TeamColor, occupant: Option<String>) {
        match color {
            TeamColor::White => self.white = occupant,
            TeamColor::Black => self.black = occupant,
        }
    }

    /// The team `identity` plays for, if seated. Someone holding both seats
    /// plays whichever side is to move.
    pub fn team_of(&self, identity: &str) -> Option<TeamColor> {
        let turn = self.game.turn();
        [turn, turn.opponent()]
            .into_iter()
            .find(|&color| self.seat(color) == Some(identity))
    }

    /// Clear every seat held by `identity`. Returns whether anything changed.
    pub fn vacate(&mut self, identity: &str) -> bool {
        let mut changed = false;
        for color in [TeamColor::White, TeamColor::Black] {
            if self.seat(color) == Some(identity) {
                self.set_seat(color, None);
                changed = true;
            }
        }
        changed
    }
}

pub trait GameStore: Send + Sync {
    /// Create a game in the opening position with both seats vacant.
    fn create(&self, name: &str) -> Result<GameId, StoreError>;

    fn load(&self, game_id: GameId) -> Result<Option<GameRecord>, StoreError>;

    /// Insert or replace the record with the same `game_id`.
    fn save(&self, record: &GameRecord) -> Result<(), StoreError>;

    fn exists(&self, game_id: GameId) -> Result<bool, StoreError>;

    /// All games, ordered by id.
    fn list(&self) -> Result<Vec<GameRecord>, StoreError>;
}
