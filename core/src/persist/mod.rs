use alloc::string::ToString;
use alloc::vec::Vec;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::*;
pub use snapshot::*;
pub use store::*;

mod snapshot;
mod store;

/// Snapshot of the game in progress.
pub const GAME_KEY: &str = "concentration:game";
/// Last board size picked in the selector.
pub const DIFFICULTY_KEY: &str = "concentration:difficulty";
/// Deck order of the current deal.
pub const DECK_KEY: &str = "concentration:deck";
/// Moves made across every open instance. Never expires.
pub const TOTAL_MOVES_KEY: &str = "concentration:total-moves";

/// How long a saved record stays usable.
pub fn freshness_window() -> TimeDelta {
    TimeDelta::days(1)
}

#[derive(Debug, Serialize, Deserialize)]
struct DifficultyRecord {
    difficulty: Dimensions,
}

/// Best-effort persistence of game state. Writes never fail the caller and
/// unreadable records are treated as missing.
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes the snapshot, the deck order and the difficulty.
    pub fn save(&mut self, engine: &PlayEngine, now: DateTime<Utc>) {
        if let Err(err) = self.try_save(&Snapshot::capture(engine), now + freshness_window()) {
            log::warn!("Could not save game: {}", err);
        }
    }

    fn try_save(
        &mut self,
        snapshot: &Snapshot,
        expires_at: DateTime<Utc>,
    ) -> core::result::Result<(), PersistError> {
        self.write(GAME_KEY, Some(snapshot), expires_at)?;
        self.write(DECK_KEY, snapshot.deck.as_ref(), expires_at)?;
        let record = DifficultyRecord {
            difficulty: snapshot.difficulty,
        };
        self.write(DIFFICULTY_KEY, Some(&record), expires_at)
    }

    /// The saved game, if there is a fresh and well-formed one.
    pub fn load(&self, now: DateTime<Utc>) -> Option<Snapshot> {
        let mut snapshot = self
            .read::<Snapshot>(GAME_KEY, now)
            .inspect_err(|err| log::warn!("Discarding saved game: {}", err))
            .ok()??;

        if snapshot.deck.is_none() {
            snapshot.deck = self
                .read::<Vec<Symbol>>(DECK_KEY, now)
                .inspect_err(|err| log::warn!("Discarding saved deck: {}", err))
                .ok()
                .flatten();
        }
        log::debug!(
            "Loaded saved {} game at {} moves",
            snapshot.difficulty,
            snapshot.move_count
        );
        Some(snapshot)
    }

    /// Invalidates the saved game and deck by overwriting them with expired markers.
    /// The difficulty is kept.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        for key in [GAME_KEY, DECK_KEY] {
            if let Err(err) = self.write::<()>(key, None, now) {
                log::warn!("Could not clear {}: {}", key, err);
            }
        }
    }

    pub fn save_difficulty(&mut self, difficulty: Dimensions, now: DateTime<Utc>) {
        let record = DifficultyRecord { difficulty };
        if let Err(err) = self.write(DIFFICULTY_KEY, Some(&record), now + freshness_window()) {
            log::warn!("Could not save difficulty: {}", err);
        }
    }

    pub fn load_difficulty(&self, now: DateTime<Utc>) -> Option<Dimensions> {
        self.read::<DifficultyRecord>(DIFFICULTY_KEY, now)
            .inspect_err(|err| log::warn!("Discarding saved difficulty: {}", err))
            .ok()
            .flatten()
            .map(|record| record.difficulty)
    }

    /// Total moves across every instance sharing the store.
    pub fn cross_tab_total(&self) -> u64 {
        match self.store.get(TOTAL_MOVES_KEY) {
            Ok(value) => value.as_deref().and_then(parse_total).unwrap_or(0),
            Err(err) => {
                log::warn!("Could not read total moves: {}", err);
                0
            }
        }
    }

    /// Adds one move to the shared total and returns the new value, if it was stored.
    pub fn bump_cross_tab_counter(&mut self) -> Option<u64> {
        let total = self.cross_tab_total().saturating_add(1);
        match self.store.set(TOTAL_MOVES_KEY, &total.to_string()) {
            Ok(()) => Some(total),
            Err(err) => {
                log::warn!("Could not update total moves: {}", err);
                None
            }
        }
    }

    fn read<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> core::result::Result<Option<T>, PersistError> {
        let Some(raw) = self.store.get(key)? else {
            log::debug!("No record under {}", key);
            return Ok(None);
        };
        let envelope: Envelope<T> = serde_json::from_str(&raw)?;
        if !envelope.is_fresh(now) {
            log::debug!("Record under {} expired at {}", key, envelope.expires_at);
            return Ok(None);
        }
        Ok(envelope.payload)
    }

    fn write<T: Serialize>(
        &mut self,
        key: &str,
        payload: Option<&T>,
        expires_at: DateTime<Utc>,
    ) -> core::result::Result<(), PersistError> {
        let envelope = Envelope {
            expires_at,
            payload,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.store.set(key, &raw)?;
        Ok(())
    }
}

impl<S: KeyValueStore + ChangeFeed> Persistence<S> {
    /// Calls back with the new total whenever another instance bumps the counter.
    pub fn observe_cross_tab_counter<F>(&self, mut callback: F) -> S::Subscription
    where
        F: FnMut(u64) + 'static,
    {
        self.store.subscribe(move |change| {
            if change.key != TOTAL_MOVES_KEY {
                return;
            }
            if let Some(total) = change.new_value.as_deref().and_then(parse_total) {
                callback(total);
            }
        })
    }
}

fn parse_total(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
