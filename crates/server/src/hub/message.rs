//! Wire protocol for the game WebSocket.

use chess_core::{ChessGame, Move, TeamColor};
use serde::{Deserialize, Serialize};

use crate::store::{GameId, GameRecord};

use super::CommandError;

/// Server → Client messages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateSnapshot {
        game_id: GameId,
        game: GameSnapshot,
    },
    Notification {
        message: String,
    },
    Failure {
        message: String,
    },
}

impl ServerMessage {
    pub fn snapshot(record: &GameRecord) -> Self {
        ServerMessage::StateSnapshot {
            game_id: record.game_id,
            game: GameSnapshot::from(record),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage::Notification {
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ServerMessage::Failure {
            message: message.into(),
        }
    }
}

/// Everything a client needs to redraw a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub finished: bool,
    #[serde(flatten)]
    pub game: ChessGame,
}

impl From<&GameRecord> for GameSnapshot {
    fn from(record: &GameRecord) -> Self {
        Self {
            name: record.name.clone(),
            white: record.white.clone(),
            black: record.black.clone(),
            finished: record.finished,
            game: record.game.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
    Observer,
}

impl Role {
    pub fn seat(self) -> Option<TeamColor> {
        match self {
            Role::White => Some(TeamColor::White),
            Role::Black => Some(TeamColor::Black),
            Role::Observer => None,
        }
    }
}

/// A command with its caller already resolved to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Join { game_id: GameId, role: Role },
    Move { game_id: GameId, mv: Move },
    Leave { game_id: GameId },
    Resign { game_id: GameId },
}

impl Command {
    pub fn game_id(&self) -> GameId {
        match *self {
            Command::Join { game_id, .. }
            | Command::Move { game_id, .. }
            | Command::Leave { game_id }
            | Command::Resign { game_id } => game_id,
        }
    }
}

/// Client → Server messages
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Connect {
        auth_token: String,
        game_id: GameId,
        role: Role,
    },
    MakeMove {
        auth_token: String,
        game_id: GameId,
        #[serde(rename = "move")]
        mv: String,
    },
    Leave {
        auth_token: String,
        game_id: GameId,
    },
    Resign {
        auth_token: String,
        game_id: GameId,
    },
}

impl ClientCommand {
    pub fn auth_token(&self) -> &str {
        match self {
            ClientCommand::Connect { auth_token, .. }
            | ClientCommand::MakeMove { auth_token, .. }
            | ClientCommand::Leave { auth_token, .. }
            | ClientCommand::Resign { auth_token, .. } => auth_token,
        }
    }

    /// Drop the token and parse any textual payload.
    pub fn into_command(self) -> Result<Command, CommandError> {
        Ok(match self {
            ClientCommand::Connect { game_id, role, .. } => Command::Join { game_id, role },
            ClientCommand::MakeMove { game_id, mv, .. } => Command::Move {
                game_id,
                mv: mv.trim().parse()?,
            },
            ClientCommand::Leave { game_id, .. } => Command::Leave { game_id },
            ClientCommand::Resign { game_id, .. } => Command::Resign { game_id },
        })
    }
}
