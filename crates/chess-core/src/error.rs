use thiserror::Error;

use crate::chess_move::Move;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },
}

impl ChessError {
    pub(crate) fn illegal(mv: Move, reason: &'static str) -> Self {
        ChessError::IllegalMove { mv, reason }
    }
}
