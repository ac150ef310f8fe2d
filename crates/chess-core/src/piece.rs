//! Pieces and pseudo-legal move generation.
//!
//! Generation here ignores whether the mover's own king is left in check;
//! [`ChessGame`](crate::ChessGame) filters for that.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::chess_move::Move;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    White,
    Black,
}

impl TeamColor {
    pub fn opponent(self) -> Self {
        match self {
            TeamColor::White => TeamColor::Black,
            TeamColor::Black => TeamColor::White,
        }
    }

    /// Row delta of a forward pawn step.
    pub fn forward(self) -> i8 {
        match self {
            TeamColor::White => 1,
            TeamColor::Black => -1,
        }
    }

    /// Row the team's pawns start on (and may double-step from).
    pub fn pawn_row(self) -> u8 {
        match self {
            TeamColor::White => 2,
            TeamColor::Black => 7,
        }
    }

    /// The opponent's back rank, where this team's pawns promote.
    pub fn promotion_row(self) -> u8 {
        match self {
            TeamColor::White => 8,
            TeamColor::Black => 1,
        }
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamColor::White => f.write_str("white"),
            TeamColor::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Kinds a pawn may promote to, in the order moves are generated.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase FEN / UCI letter.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    team: TeamColor,
    kind: PieceKind,
}

impl Piece {
    pub fn new(team: TeamColor, kind: PieceKind) -> Self {
        Self { team, kind }
    }

    pub fn team(self) -> TeamColor {
        self.team
    }

    pub fn kind(self) -> PieceKind {
        self.kind
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn fen_char(self) -> char {
        let c = self.kind.letter();
        match self.team {
            TeamColor::White => c.to_ascii_uppercase(),
            TeamColor::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let team = if c.is_ascii_uppercase() {
            TeamColor::White
        } else {
            TeamColor::Black
        };
        Some(Self { team, kind })
    }

    /// Every pseudo-legal move for this piece standing on `from`.
    pub fn moves(self, board: &Board, from: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        match self.kind {
            PieceKind::King => self.step_moves(board, from, &KING_STEPS, &mut moves),
            PieceKind::Knight => self.step_moves(board, from, &KNIGHT_JUMPS, &mut moves),
            PieceKind::Rook => self.slide_moves(board, from, &ORTHOGONAL, &mut moves),
            PieceKind::Bishop => self.slide_moves(board, from, &DIAGONAL, &mut moves),
            PieceKind::Queen => {
                self.slide_moves(board, from, &ORTHOGONAL, &mut moves);
                self.slide_moves(board, from, &DIAGONAL, &mut moves);
            }
            PieceKind::Pawn => self.pawn_moves(board, from, &mut moves),
        }
        moves
    }

    fn is_enemy_of(self, other: Piece) -> bool {
        self.team != other.team
    }

    fn step_moves(self, board: &Board, from: Square, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in offsets {
            let Some(to) = from.offset(dr, dc) else {
                continue;
            };
            match board.piece(to) {
                Some(other) if !self.is_enemy_of(other) => {}
                _ => moves.push(Move::new(from, to)),
            }
        }
    }

    fn slide_moves(self, board: &Board, from: Square, rays: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in rays {
            let mut cursor = from;
            while let Some(to) = cursor.offset(dr, dc) {
                match board.piece(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(other) => {
                        if self.is_enemy_of(other) {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                cursor = to;
            }
        }
    }

    fn pawn_moves(self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let forward = self.team.forward();

        if let Some(one) = from.offset(forward, 0) {
            if board.piece(one).is_none() {
                self.push_pawn_move(from, one, moves);

                if from.row() == self.team.pawn_row() {
                    if let Some(two) = one.offset(forward, 0) {
                        if board.piece(two).is_none() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for side in [-1, 1] {
            let Some(to) = from.offset(forward, side) else {
                continue;
            };
            if board.piece(to).is_some_and(|other| self.is_enemy_of(other)) {
                self.push_pawn_move(from, to, moves);
            }
        }
    }

    /// A pawn landing on the far rank expands into one move per promotion kind.
    fn push_pawn_move(self, from: Square, to: Square, moves: &mut Vec<Move>) {
        if to.row() == self.team.promotion_row() {
            moves.extend(
                PieceKind::PROMOTIONS
                    .iter()
                    .map(|&kind| Move::promoting(from, to, kind)),
            );
        } else {
            moves.push(Move::new(from, to));
        }
    }
}
