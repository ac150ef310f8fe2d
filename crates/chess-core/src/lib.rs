//! Chess rules engine: board representation, pseudo-legal move generation,
//! check-safe move filtering and end-of-game detection.
//!
//! Castling, en passant and draw rules other than stalemate are not modeled.

pub mod board;
pub mod chess_move;
pub mod error;
pub mod game;
pub mod piece;
pub mod square;

pub use board::Board;
pub use chess_move::Move;
pub use error::ChessError;
pub use game::ChessGame;
pub use piece::{Piece, PieceKind, TeamColor};
pub use square::Square;
