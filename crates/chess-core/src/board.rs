use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::piece::{Piece, PieceKind, TeamColor};
use crate::square::Square;

/// FEN piece placement of the standard opening position.
pub const STANDARD_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// 8x8 grid of optional pieces, stored row-major (rank 1 first).
///
/// Serializes as the piece-placement field of FEN.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Board in the standard opening position.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    /// Clear the board and set up the standard opening position.
    pub fn reset(&mut self) {
        self.cells = [[None; 8]; 8];
        for (team, back, pawns) in [(TeamColor::White, 0, 1), (TeamColor::Black, 7, 6)] {
            for col in 0..8 {
                self.cells[back][col] = Some(Piece::new(team, BACK_RANK[col]));
                self.cells[pawns][col] = Some(Piece::new(team, PieceKind::Pawn));
            }
        }
    }

    pub fn piece(&self, square: Square) -> Option<Piece> {
        let (r, c) = square.index();
        self.cells[r][c]
    }

    /// Place `piece` on `square`, replacing whatever stood there.
    pub fn add_piece(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        let (r, c) = square.index();
        self.cells[r][c].replace(piece)
    }

    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let (r, c) = square.index();
        self.cells[r][c].take()
    }

    /// Occupied squares with their pieces, rank 1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece(sq).map(|p| (sq, p)))
    }

    pub fn team_pieces(&self, team: TeamColor) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.team() == team)
    }

    pub fn find_king(&self, team: TeamColor) -> Option<Square> {
        self.team_pieces(team)
            .find(|(_, p)| p.kind() == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Parse the piece-placement field of a FEN string (rank 8 first).
    pub fn from_placement(placement: &str) -> Result<Self, ChessError> {
        let bad = || ChessError::InvalidFormat(format!("board placement '{placement}'"));

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(bad());
        }

        let mut board = Self::empty();
        for (i, rank) in ranks.iter().enumerate() {
            let row = 7 - i;
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(bad());
                    }
                    col += skip as usize;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(bad)?;
                    if col >= 8 {
                        return Err(bad());
                    }
                    board.cells[row][col] = Some(piece);
                    col += 1;
                }
                if col > 8 {
                    return Err(bad());
                }
            }
            if col != 8 {
                return Err(bad());
            }
        }
        Ok(board)
    }

    pub fn to_placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for row in (0..8).rev() {
            let mut empty = 0;
            for cell in &self.cells[row] {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row > 0 {
                out.push('/');
            }
        }
        out
    }
}

impl TryFrom<String> for Board {
    type Error = ChessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Board::from_placement(&value)
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_placement()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", self.to_placement())
    }
}
