//! Game state: turn order, legal-move filtering and end-of-game predicates.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::chess_move::Move;
use crate::error::ChessError;
use crate::piece::{Piece, TeamColor};
use crate::square::Square;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessGame {
    board: Board,
    turn: TeamColor,
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessGame {
    /// New game in the opening position, white to move.
    pub fn new() -> Self {
        Self {
            board: Board::standard(),
            turn: TeamColor::White,
        }
    }

    /// Game resumed from an arbitrary position.
    pub fn from_position(board: Board, turn: TeamColor) -> Self {
        Self { board, turn }
    }

    pub fn turn(&self) -> TeamColor {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Legal moves for the piece on `square`.
    ///
    /// An empty square yields an empty list, the same as a piece with no legal
    /// moves. The board is identical before and after the call.
    pub fn valid_moves(&mut self, square: Square) -> Vec<Move> {
        let Some(piece) = self.board.piece(square) else {
            return Vec::new();
        };
        let team = piece.team();

        piece
            .moves(&self.board, square)
            .into_iter()
            .filter(|&mv| {
                let trial = TrialMove::apply(&mut self.board, mv, piece);
                !king_in_check(&trial, team)
            })
            .collect()
    }

    /// All legal moves for `team`, regardless of whose turn it is.
    pub fn legal_moves(&mut self, team: TeamColor) -> Vec<Move> {
        let squares: Vec<Square> = self.board.team_pieces(team).map(|(sq, _)| sq).collect();
        squares
            .into_iter()
            .flat_map(|sq| self.valid_moves(sq))
            .collect()
    }

    pub fn make_move(&mut self, mv: Move) -> Result<(), ChessError> {
        let piece = self
            .board
            .piece(mv.from())
            .ok_or_else(|| ChessError::illegal(mv, "no piece on the starting square"))?;
        if piece.team() != self.turn {
            return Err(ChessError::illegal(mv, "not that team's turn"));
        }
        if !self.valid_moves(mv.from()).contains(&mv) {
            return Err(ChessError::illegal(mv, "not a legal move for that piece"));
        }

        self.board.remove_piece(mv.from());
        let placed = match mv.promotion() {
            Some(kind) => Piece::new(piece.team(), kind),
            None => piece,
        };
        self.board.add_piece(mv.to(), placed);
        self.turn = self.turn.opponent();
        Ok(())
    }

    /// Whether any opposing piece attacks `team`'s king.
    ///
    /// # Panics
    ///
    /// Panics if `team` has no king on the board.
    pub fn is_in_check(&self, team: TeamColor) -> bool {
        king_in_check(&self.board, team)
    }

    pub fn is_in_checkmate(&mut self, team: TeamColor) -> bool {
        self.is_in_check(team) && !self.has_legal_move(team)
    }

    pub fn is_in_stalemate(&mut self, team: TeamColor) -> bool {
        !self.is_in_check(team) && !self.has_legal_move(team)
    }

    fn has_legal_move(&mut self, team: TeamColor) -> bool {
        let squares: Vec<Square> = self.board.team_pieces(team).map(|(sq, _)| sq).collect();
        squares.into_iter().any(|sq| !self.valid_moves(sq).is_empty())
    }
}

/// Pseudo-legal attack test; never filters for check, so it cannot recurse.
fn king_in_check(board: &Board, team: TeamColor) -> bool {
    let king = board
        .find_king(team)
        .unwrap_or_else(|| panic!("no {team} king on the board: {board:?}"));

    board
        .team_pieces(team.opponent())
        .any(|(sq, piece)| piece.moves(board, sq).iter().any(|mv| mv.to() == king))
}

/// A move tried out on the live board. Dropping it puts the board back,
/// including any captured piece, on every exit path.
struct TrialMove<'a> {
    board: &'a mut Board,
    mv: Move,
    moved: Piece,
    captured: Option<Piece>,
}

impl<'a> TrialMove<'a> {
    fn apply(board: &'a mut Board, mv: Move, moved: Piece) -> Self {
        board.remove_piece(mv.from());
        let captured = board.add_piece(mv.to(), moved);
        Self {
            board,
            mv,
            moved,
            captured,
        }
    }
}

impl Deref for TrialMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl Drop for TrialMove<'_> {
    fn drop(&mut self) {
        match self.captured {
            Some(captured) => self.board.add_piece(self.mv.to(), captured),
            None => self.board.remove_piece(self.mv.to()),
        };
        self.board.add_piece(self.mv.from(), self.moved);
    }
}
