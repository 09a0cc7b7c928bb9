use super::*;

/// Uniform shuffle of the symbol pool, reproducible from the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomDeckGenerator {
    seed: u64,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(self, dimensions: Dimensions) -> Deck {
        use rand::prelude::*;
        use rand::rngs::SmallRng;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let deck = Deck::ordered(dimensions).shuffled_with(|symbols| symbols.shuffle(&mut rng));
        log::debug!("Dealt {} board with seed {}", dimensions, self.seed);
        deck
    }
}
