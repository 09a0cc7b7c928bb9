use crate::*;
pub use random::*;

mod random;

pub trait DeckGenerator {
    fn generate(self, dimensions: Dimensions) -> Deck;
}
