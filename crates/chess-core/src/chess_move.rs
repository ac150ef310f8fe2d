use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::piece::PieceKind;
use crate::square::Square;

/// A move from one square to another, with an optional promotion kind.
///
/// Two moves are equal only if all three fields match. The moving piece is
/// not recorded; it is whatever stands on `from` when the move is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    from: Square,
    to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }

    pub fn from(self) -> Square {
        self.from
    }

    pub fn to(self) -> Square {
        self.to
    }

    pub fn promotion(self) -> Option<PieceKind> {
        self.promotion
    }
}

/// Parses coordinate notation: `e2e4`, or `e7e8q` with a promotion letter.
impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ChessError::InvalidFormat(format!("move '{s}'"));
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(bad());
        }

        let from: Square = s[0..2].parse().map_err(|_| bad())?;
        let to: Square = s[2..4].parse().map_err(|_| bad())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(bad()),
            },
        };

        Ok(Self { from, to, promotion })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}
