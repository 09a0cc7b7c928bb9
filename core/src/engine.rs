use alloc::vec;
use alloc::vec::Vec;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// How long a mismatched pair stays face up before the host calls [`PlayEngine::conceal`].
pub const MISMATCH_DELAY: Duration = Duration::from_millis(1000);

/// Period of [`PlayEngine::tick`].
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Dealt,
    Won,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Counters and face state of a deal, detached from the deck itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub move_count: Count,
    pub elapsed_secs: Count,
    pub matched_count: usize,
    pub matched: Vec<CardIndex>,
    pub revealed: Vec<CardIndex>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayEngine {
    deck: Deck,
    faces: Vec<CardFace>,
    pending: SmallVec<[CardIndex; 2]>,
    move_count: Count,
    elapsed_secs: Count,
    matched_count: usize,
    state: EngineState,
}

impl PlayEngine {
    pub fn new(deck: Deck) -> Self {
        let faces = vec![CardFace::Hidden; deck.len()];
        Self {
            deck,
            faces,
            pending: SmallVec::new(),
            move_count: 0,
            elapsed_secs: 0,
            matched_count: 0,
            state: Default::default(),
        }
    }

    /// Fresh shuffled deal with all counters at zero.
    pub fn deal(dimensions: Dimensions, seed: u64) -> Self {
        Self::new(RandomDeckGenerator::new(seed).generate(dimensions))
    }

    /// Rebuilds a game from saved progress on top of the exact deck it was played with.
    ///
    /// A pair that was waiting to be concealed comes back face down, since the
    /// delay that would have hidden it is gone.
    pub fn restore(deck: Deck, progress: &Progress) -> Result<Self> {
        let mut engine = Self::new(deck);
        let len = engine.deck.len();

        let in_range = |indices: &[CardIndex]| indices.iter().all(|&index| index < len);
        if !in_range(&progress.matched) || !in_range(&progress.revealed) {
            return Err(GameError::InconsistentProgress);
        }
        if progress.matched.len() != progress.matched_count
            || progress.matched_count % 2 != 0
            || progress.revealed.len() > 2
            || (progress.move_count as usize) < progress.matched_count / 2
        {
            return Err(GameError::InconsistentProgress);
        }

        let mut pair_counts = [0u8; MAX_PAIRS];
        for &index in &progress.matched {
            if engine.faces[index] != CardFace::Hidden {
                return Err(GameError::InconsistentProgress);
            }
            engine.faces[index] = CardFace::Matched;
            pair_counts[engine.deck[index].index()] += 1;
        }
        if pair_counts.iter().any(|&count| count != 0 && count != 2) {
            return Err(GameError::InconsistentProgress);
        }

        match progress.revealed[..] {
            [] => {}
            [index] => {
                if engine.faces[index] != CardFace::Hidden {
                    return Err(GameError::InconsistentProgress);
                }
                engine.faces[index] = CardFace::Revealed;
                engine.pending.push(index);
            }
            [first, second] => {
                let distinct = first != second
                    && engine.faces[first].is_hidden()
                    && engine.faces[second].is_hidden();
                if !distinct || engine.deck[first] == engine.deck[second] {
                    return Err(GameError::InconsistentProgress);
                }
                log::debug!("Restored mismatched pair {} and {} face down", first, second);
            }
            _ => return Err(GameError::InconsistentProgress),
        }

        engine.move_count = progress.move_count;
        engine.elapsed_secs = progress.elapsed_secs;
        engine.matched_count = progress.matched_count;
        if engine.matched_count == len {
            engine.state = EngineState::Won;
        }
        Ok(engine)
    }

    pub fn progress(&self) -> Progress {
        let matched = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| matches!(face, CardFace::Matched))
            .map(|(index, _)| index)
            .collect();
        Progress {
            move_count: self.move_count,
            elapsed_secs: self.elapsed_secs,
            matched_count: self.matched_count,
            matched,
            revealed: self.pending.to_vec(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn dimensions(&self) -> Dimensions {
        self.deck.dimensions()
    }

    pub fn move_count(&self) -> Count {
        self.move_count
    }

    pub fn elapsed_secs(&self) -> Count {
        self.elapsed_secs
    }

    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    /// Cards revealed but not yet resolved as a pair.
    pub fn pending(&self) -> &[CardIndex] {
        &self.pending
    }

    pub fn face_at(&self, index: CardIndex) -> CardFace {
        self.faces[index]
    }

    pub fn card_at(&self, index: CardIndex) -> Card {
        Card {
            index,
            symbol: self.deck[index],
            face: self.faces[index],
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        (0..self.deck.len()).map(|index| self.card_at(index))
    }

    /// Turns a card face up and resolves the pair when it is the second one.
    ///
    /// Flipping a card that is already up, while a pair waits to be concealed, or
    /// after the game is won is a no-op.
    pub fn flip(&mut self, index: CardIndex) -> Result<Transition> {
        use FlipOutcome::*;

        let index = self.deck.validate_index(index)?;

        if self.state.is_finished() || self.pending.len() >= 2 || self.faces[index].is_shown() {
            log::trace!("Ignoring flip of card {}", index);
            return Ok(Transition::no_change(self.move_count));
        }

        self.faces[index] = CardFace::Revealed;
        self.pending.push(index);
        log::trace!("Revealed card {} ({})", index, self.deck[index]);

        let &[first, second] = self.pending.as_slice() else {
            return Ok(Transition::new(AwaitingSecond, &[index], self.move_count));
        };

        self.move_count = self.move_count.saturating_add(1);

        if self.deck[first] != self.deck[second] {
            log::debug!("Cards {} and {} do not match", first, second);
            return Ok(Transition::new(Mismatched, &[second], self.move_count));
        }

        self.faces[first] = CardFace::Matched;
        self.faces[second] = CardFace::Matched;
        self.matched_count += 2;
        self.pending.clear();
        log::debug!("Cards {} and {} match", first, second);

        let outcome = if self.matched_count == self.deck.len() {
            self.state = EngineState::Won;
            log::info!(
                "Won {} board in {} moves and {} s",
                self.dimensions(),
                self.move_count,
                self.elapsed_secs
            );
            Won
        } else {
            Matched
        };
        Ok(Transition::new(outcome, &[first, second], self.move_count))
    }

    /// Turns a pending mismatched pair face down again.
    pub fn conceal(&mut self) -> Transition {
        let &[first, second] = self.pending.as_slice() else {
            return Transition::no_change(self.move_count);
        };

        self.faces[first] = CardFace::Hidden;
        self.faces[second] = CardFace::Hidden;
        self.pending.clear();
        log::trace!("Concealed cards {} and {}", first, second);
        Transition::new(FlipOutcome::Concealed, &[first, second], self.move_count)
    }

    /// Advances the clock by one second unless the game is won.
    pub fn tick(&mut self) -> Count {
        if !self.state.is_finished() {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        }
        self.elapsed_secs
    }
}
