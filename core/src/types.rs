use core::fmt;
use serde::{Deserialize, Serialize};

use crate::GameError;

/// Board position of a card, row-major from the top-left, stable for one deal.
pub type CardIndex = usize;

/// Count type used for moves and elapsed seconds.
pub type Count = u32;

/// One symbol per letter of the alphabet, so at most this many pairs fit on a board.
pub const MAX_PAIRS: usize = 26;

/// Card face symbol, one of the letters `A` to `Z`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Symbol(u8);

impl Symbol {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_PAIRS).then(|| Self(index as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn letter(self) -> char {
        (b'A' + self.0) as char
    }
}

impl TryFrom<char> for Symbol {
    type Error = GameError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        if value.is_ascii_uppercase() {
            Ok(Self(value as u8 - b'A'))
        } else {
            Err(GameError::InvalidSymbol)
        }
    }
}

impl From<Symbol> for char {
    fn from(value: Symbol) -> Self {
        value.letter()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
