//! Board coordinates.
//!
//! Rows and columns are 1-indexed: `a1` is (1, 1), `h8` is (8, 8). Every
//! off-board coordinate is rejected at construction, so a `Square` can always
//! be used to index a [`Board`](crate::Board) directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Returns `None` unless both coordinates are in `1..=8`.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (1..=8).contains(&row) && (1..=8).contains(&col) {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// The square `d_row` rows and `d_col` columns away, if it is on the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if row < 1 || col < 1 {
            return None;
        }
        Self::new(row as u8, col as u8)
    }

    /// All 64 squares, rank 1 first, files a..h within each rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (1..=8u8).flat_map(|row| (1..=8u8).map(move |col| Square { row, col }))
    }

    pub(crate) fn index(self) -> (usize, usize) {
        (self.row as usize - 1, self.col as usize - 1)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidFormat(format!("square '{s}'")));
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ChessError::InvalidFormat(format!("square '{s}'")));
        }
        Ok(Square {
            row: rank - b'0',
            col: file - b'a' + 1,
        })
    }
}

impl TryFrom<String> for Square {
    type Error = ChessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col - 1) as char, self.row)
    }
}
