use alloc::vec::Vec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

/// Wrapper stored around every expiring record.
///
/// An envelope with no payload is the marker left behind by a clear.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Persisted copy of a game in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub difficulty: Dimensions,
    pub move_count: Count,
    pub elapsed_secs: Count,
    pub matched_count: usize,
    pub revealed: Vec<CardIndex>,
    #[serde(default)]
    pub matched: Vec<CardIndex>,
    #[serde(default)]
    pub deck: Option<Vec<Symbol>>,
}

impl Snapshot {
    pub fn capture(engine: &PlayEngine) -> Self {
        let Progress {
            move_count,
            elapsed_secs,
            matched_count,
            matched,
            revealed,
        } = engine.progress();
        Self {
            difficulty: engine.dimensions(),
            move_count,
            elapsed_secs,
            matched_count,
            revealed,
            matched,
            deck: Some(engine.deck().symbols().to_vec()),
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            move_count: self.move_count,
            elapsed_secs: self.elapsed_secs,
            matched_count: self.matched_count,
            matched: self.matched.clone(),
            revealed: self.revealed.clone(),
        }
    }

    /// Rebuilds the engine on the saved deck order. Without one the saved indices
    /// would point at a different shuffle, so the snapshot is refused instead.
    pub fn restore(&self) -> core::result::Result<PlayEngine, PersistError> {
        let symbols = self.deck.clone().ok_or(PersistError::MissingDeck)?;
        let deck = Deck::from_symbols(self.difficulty, symbols)?;
        Ok(PlayEngine::restore(deck, &self.progress())?)
    }
}
