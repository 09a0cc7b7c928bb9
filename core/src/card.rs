use serde::{Deserialize, Serialize};

use crate::{CardIndex, Symbol};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFace {
    #[default]
    Hidden,
    /// Face up, waiting for pair resolution.
    Revealed,
    Matched,
}

impl CardFace {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Whether the symbol is visible to the player
    pub const fn is_shown(self) -> bool {
        !self.is_hidden()
    }
}

/// A card as the view sees it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub index: CardIndex,
    pub symbol: Symbol,
    pub face: CardFace,
}

impl Card {
    pub const fn is_revealed(&self) -> bool {
        self.face.is_shown()
    }

    pub const fn is_matched(&self) -> bool {
        matches!(self.face, CardFace::Matched)
    }

    /// The symbol, but only when the player may see it.
    pub fn visible_symbol(&self) -> Option<Symbol> {
        self.face.is_shown().then_some(self.symbol)
    }
}
