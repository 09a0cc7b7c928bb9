#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::ops::Index;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use card::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use persist::*;
pub use session::*;
pub use types::*;

mod card;
mod engine;
mod error;
mod generator;
mod persist;
mod session;
mod types;

/// Board size, which doubles as the difficulty a player picks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimensions {
    rows: u8,
    cols: u8,
}

impl Dimensions {
    /// Boards offered by the difficulty selector, smallest first.
    pub const PRESETS: [Dimensions; 5] = [
        Self::new_unchecked(2, 2),
        Self::new_unchecked(4, 4),
        Self::new_unchecked(4, 6),
        Self::new_unchecked(6, 6),
        Self::new_unchecked(6, 8),
    ];

    pub const DEFAULT: Dimensions = Self::new_unchecked(4, 4);

    pub(crate) const fn new_unchecked(rows: u8, cols: u8) -> Self {
        Self { rows, cols }
    }

    pub fn new(rows: u8, cols: u8) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions);
        }
        let dimensions = Self::new_unchecked(rows, cols);
        if dimensions.card_count() % 2 != 0 {
            return Err(GameError::OddCardCount);
        }
        if dimensions.pair_count() > MAX_PAIRS {
            return Err(GameError::TooManyPairs);
        }
        Ok(dimensions)
    }

    pub const fn rows(self) -> u8 {
        self.rows
    }

    pub const fn cols(self) -> u8 {
        self.cols
    }

    pub const fn card_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub const fn pair_count(self) -> usize {
        self.card_count() / 2
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Parses the `"RxC"` form used by the difficulty selector and in storage.
impl FromStr for Dimensions {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let (rows, cols) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or(GameError::InvalidDimensions)?;
        let rows = rows.trim().parse().map_err(|_| GameError::InvalidDimensions)?;
        let cols = cols.trim().parse().map_err(|_| GameError::InvalidDimensions)?;
        Self::new(rows, cols)
    }
}

impl TryFrom<String> for Dimensions {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Dimensions> for String {
    fn from(value: Dimensions) -> Self {
        value.to_string()
    }
}

/// Symbol order of one deal. Every symbol on the board appears exactly twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    dimensions: Dimensions,
    symbols: Vec<Symbol>,
}

impl Deck {
    /// Unshuffled pool: the first `pair_count` letters, then the same letters again.
    pub fn ordered(dimensions: Dimensions) -> Self {
        let pairs = (0..dimensions.pair_count()).filter_map(Symbol::from_index);
        let symbols = pairs.clone().chain(pairs).collect();
        Self {
            dimensions,
            symbols,
        }
    }

    /// Builds a deck from an explicit order. It must fit `dimensions` and hold each of
    /// the first `pair_count` letters exactly twice, like a dealt deck.
    pub fn from_symbols(dimensions: Dimensions, symbols: Vec<Symbol>) -> Result<Self> {
        if symbols.len() != dimensions.card_count() {
            return Err(GameError::DeckMismatch);
        }

        let mut counts = [0u8; MAX_PAIRS];
        for symbol in &symbols {
            counts[symbol.index()] += 1;
        }
        let (dealt, unused) = counts.split_at(dimensions.pair_count());
        if dealt.iter().any(|&count| count != 2) || unused.iter().any(|&count| count != 0) {
            return Err(GameError::UnpairedSymbol);
        }

        Ok(Self {
            dimensions,
            symbols,
        })
    }

    pub(crate) fn shuffled_with(mut self, shuffle: impl FnOnce(&mut [Symbol])) -> Self {
        shuffle(&mut self.symbols);
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn validate_index(&self, index: CardIndex) -> Result<CardIndex> {
        if index < self.symbols.len() {
            Ok(index)
        } else {
            Err(GameError::InvalidIndex)
        }
    }
}

impl Index<CardIndex> for Deck {
    type Output = Symbol;

    fn index(&self, index: CardIndex) -> &Self::Output {
        &self.symbols[index]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    NoChange,
    /// First card of a pair is up.
    AwaitingSecond,
    Matched,
    /// Both cards stay up until [`PlayEngine::conceal`] runs after [`MISMATCH_DELAY`].
    Mismatched,
    /// The last pair was matched.
    Won,
    /// A mismatched pair was turned face down again.
    Concealed,
}

impl FlipOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Whether this outcome completed a two-card reveal, which counts as one move.
    pub const fn completes_pair(self) -> bool {
        matches!(self, Self::Matched | Self::Mismatched | Self::Won)
    }

    pub const fn needs_conceal(self) -> bool {
        matches!(self, Self::Mismatched)
    }
}

/// Result of one command, with enough detail for a view to redraw only what changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub outcome: FlipOutcome,
    /// Cards whose face changed.
    pub changed: SmallVec<[CardIndex; 2]>,
    pub move_count: Count,
}

impl Transition {
    pub(crate) fn new(outcome: FlipOutcome, changed: &[CardIndex], move_count: Count) -> Self {
        Self {
            outcome,
            changed: SmallVec::from_slice(changed),
            move_count,
        }
    }

    pub(crate) fn no_change(move_count: Count) -> Self {
        Self::new(FlipOutcome::NoChange, &[], move_count)
    }

    pub const fn has_update(&self) -> bool {
        self.outcome.has_update()
    }

    pub fn just_won(&self) -> bool {
        self.outcome == FlipOutcome::Won
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn dimensions_parse_selector_values() {
        let dims: Dimensions = "4x4".parse().unwrap();
        assert_eq!((dims.rows(), dims.cols()), (4, 4));
        assert_eq!(dims.card_count(), 16);
        assert_eq!(dims.pair_count(), 8);

        let dims: Dimensions = " 6 X 8 ".parse().unwrap();
        assert_eq!(dims.to_string(), "6x8");
    }

    #[test]
    fn dimensions_reject_unplayable_boards() {
        assert_eq!("3x3".parse::<Dimensions>(), Err(GameError::OddCardCount));
        assert_eq!("8x8".parse::<Dimensions>(), Err(GameError::TooManyPairs));
        assert_eq!("0x4".parse::<Dimensions>(), Err(GameError::InvalidDimensions));
        assert_eq!("4by4".parse::<Dimensions>(), Err(GameError::InvalidDimensions));
        assert_eq!("x4".parse::<Dimensions>(), Err(GameError::InvalidDimensions));
    }

    #[test]
    fn presets_are_valid_boards() {
        for preset in Dimensions::PRESETS {
            assert_eq!(Dimensions::new(preset.rows(), preset.cols()), Ok(preset));
        }
        assert!(Dimensions::PRESETS.contains(&Dimensions::default()));
    }

    #[test]
    fn dimensions_serialize_as_selector_string() {
        let json = serde_json::to_string(&Dimensions::DEFAULT).unwrap();
        assert_eq!(json, "\"4x4\"");
        assert!(serde_json::from_str::<Dimensions>("\"5x5\"").is_err());
    }

    #[test]
    fn deck_from_symbols_requires_pairs() {
        let dims = Dimensions::new(2, 2).unwrap();
        let a = Symbol::from_index(0).unwrap();
        let b = Symbol::from_index(1).unwrap();

        assert!(Deck::from_symbols(dims, vec![a, b, b, a]).is_ok());
        assert_eq!(
            Deck::from_symbols(dims, vec![a, a, a, b]),
            Err(GameError::UnpairedSymbol)
        );
        assert_eq!(
            Deck::from_symbols(dims, vec![a, a]),
            Err(GameError::DeckMismatch)
        );
    }

    #[test]
    fn deck_from_symbols_requires_leading_letters() {
        let dims = Dimensions::new(2, 2).unwrap();
        let a = Symbol::from_index(0).unwrap();
        let y = Symbol::from_index(24).unwrap();
        let z = Symbol::from_index(25).unwrap();

        assert_eq!(
            Deck::from_symbols(dims, vec![y, z, z, y]),
            Err(GameError::UnpairedSymbol)
        );
        assert_eq!(
            Deck::from_symbols(dims, vec![a, z, z, a]),
            Err(GameError::UnpairedSymbol)
        );
    }

    #[test]
    fn ordered_deck_uses_leading_letters_twice() {
        let deck = Deck::ordered(Dimensions::new(2, 3).unwrap());
        let letters: String = deck.symbols().iter().map(|s| s.letter()).collect();
        assert_eq!(letters, "ABCABC");
    }
}
