use chrono::{DateTime, Utc};

use crate::*;

/// Where the session is in `idle → dealt → (flip/flip)* → won`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Dealt,
    Won,
}

/// Command interface between a host UI and the game: owns the engine, persists
/// after every mutation and keeps the shared move counter up to date.
pub struct GameSession<S> {
    engine: Option<PlayEngine>,
    persistence: Persistence<S>,
    difficulty: Dimensions,
}

impl<S: KeyValueStore> GameSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: None,
            persistence: Persistence::new(store),
            difficulty: Dimensions::default(),
        }
    }

    /// Resumes the saved game, or deals a fresh one on the last chosen board.
    pub fn start(&mut self, seed: u64, now: DateTime<Utc>) -> &PlayEngine {
        let restored = self.persistence.load(now).and_then(|snapshot| {
            snapshot
                .restore()
                .inspect_err(|err| log::warn!("Saved game could not be restored: {}", err))
                .ok()
        });

        match restored {
            Some(engine) => {
                log::debug!("Resuming {} game", engine.dimensions());
                self.difficulty = engine.dimensions();
                &*self.engine.insert(engine)
            }
            None => {
                self.difficulty = self.persistence.load_difficulty(now).unwrap_or_default();
                self.deal(seed, now)
            }
        }
    }

    /// Discards the current deal and starts over on the same board.
    pub fn new_game(&mut self, seed: u64, now: DateTime<Utc>) -> &PlayEngine {
        self.persistence.clear(now);
        self.deal(seed, now)
    }

    pub fn change_difficulty(
        &mut self,
        difficulty: Dimensions,
        seed: u64,
        now: DateTime<Utc>,
    ) -> &PlayEngine {
        log::debug!("Difficulty changed to {}", difficulty);
        self.difficulty = difficulty;
        self.persistence.save_difficulty(difficulty, now);
        self.new_game(seed, now)
    }

    fn deal(&mut self, seed: u64, now: DateTime<Utc>) -> &PlayEngine {
        let engine = self.engine.insert(PlayEngine::deal(self.difficulty, seed));
        self.persistence.save(engine, now);
        engine
    }

    /// Flips a card. Every completed pair also bumps the shared move counter.
    pub fn flip(&mut self, index: CardIndex, now: DateTime<Utc>) -> Result<Transition> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(Transition::no_change(0));
        };

        let transition = engine.flip(index)?;
        if transition.outcome.completes_pair() {
            self.persistence.bump_cross_tab_counter();
        }
        if transition.has_update() {
            self.persistence.save(engine, now);
        }
        Ok(transition)
    }

    /// Hides a mismatched pair once the display delay is over.
    pub fn conceal(&mut self, now: DateTime<Utc>) -> Transition {
        let Some(engine) = self.engine.as_mut() else {
            return Transition::no_change(0);
        };

        let transition = engine.conceal();
        if transition.has_update() {
            self.persistence.save(engine, now);
        }
        transition
    }

    /// One second of play time; `None` when idle or already won.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Count> {
        let engine = self.engine.as_mut().filter(|engine| !engine.is_finished())?;
        let elapsed = engine.tick();
        self.persistence.save(engine, now);
        Some(elapsed)
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.engine {
            None => SessionPhase::Idle,
            Some(engine) if engine.is_finished() => SessionPhase::Won,
            Some(_) => SessionPhase::Dealt,
        }
    }

    pub fn engine(&self) -> Option<&PlayEngine> {
        self.engine.as_ref()
    }

    pub fn difficulty(&self) -> Dimensions {
        self.difficulty
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn cross_tab_total(&self) -> u64 {
        self.persistence.cross_tab_total()
    }
}

impl<S: KeyValueStore + ChangeFeed> GameSession<S> {
    pub fn observe_cross_tab_moves<F>(&self, callback: F) -> S::Subscription
    where
        F: FnMut(u64) + 'static,
    {
        self.persistence.observe_cross_tab_counter(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn partner_of(engine: &PlayEngine, index: CardIndex) -> CardIndex {
        let symbol = engine.deck()[index];
        (0..engine.deck().len())
            .find(|&other| other != index && engine.deck()[other] == symbol)
            .unwrap()
    }

    fn mismatch_of(engine: &PlayEngine, index: CardIndex) -> CardIndex {
        let symbol = engine.deck()[index];
        (0..engine.deck().len())
            .find(|&other| engine.deck()[other] != symbol)
            .unwrap()
    }

    #[test]
    fn idle_session_ignores_commands() {
        let mut session = GameSession::new(MemoryStore::new());

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!session.flip(0, at(0)).unwrap().has_update());
        assert!(!session.conceal(at(0)).has_update());
        assert_eq!(session.tick(at(0)), None);
    }

    #[test]
    fn start_without_saved_game_deals_default_board() {
        let mut session = GameSession::new(MemoryStore::new());

        let engine = session.start(1, at(0));

        assert_eq!(engine.dimensions(), Dimensions::DEFAULT);
        assert_eq!(engine.move_count(), 0);
        assert_eq!(session.phase(), SessionPhase::Dealt);
        assert!(session.persistence().load(at(0)).is_some());
    }

    #[test]
    fn reload_resumes_the_same_deal() {
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        session.start(4, at(0));
        let engine = session.engine().unwrap().clone();
        let partner = partner_of(&engine, 0);
        session.flip(0, at(1)).unwrap();
        session.flip(partner, at(1)).unwrap();
        session.tick(at(2));
        let before_reload = session.engine().unwrap().clone();

        let mut reloaded = GameSession::new(store);
        let resumed = reloaded.start(99, at(3));

        assert_eq!(*resumed, before_reload);
        assert_eq!(resumed.matched_count(), 2);
        assert_eq!(resumed.elapsed_secs(), 1);
    }

    #[test]
    fn saved_game_resumes_within_a_day_then_expires() {
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        let hard = Dimensions::new(6, 6).unwrap();
        session.change_difficulty(hard, 1, at(0));
        session.flip(0, at(0)).unwrap();

        let day = freshness_window().num_seconds();
        let mut reloaded = GameSession::new(store.connect());
        let engine = reloaded.start(2, at(day / 2));
        assert_eq!(engine.dimensions(), hard);
        assert_eq!(engine.pending(), &[0]);

        let mut reloaded = GameSession::new(store);
        let engine = reloaded.start(2, at(day + 1));
        assert_eq!(engine.move_count(), 0);
        assert_eq!(engine.pending(), &[] as &[CardIndex]);
        assert_eq!(engine.dimensions(), Dimensions::DEFAULT);
    }

    #[test]
    fn new_game_discards_progress() {
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        session.start(5, at(0));
        session.flip(0, at(0)).unwrap();

        let engine = session.new_game(6, at(1));
        assert_eq!(engine.pending(), &[] as &[CardIndex]);

        let mut reloaded = GameSession::new(store);
        assert!(reloaded.start(7, at(2)).pending().is_empty());
    }

    #[test]
    fn difficulty_change_redeals_and_is_remembered() {
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        session.start(1, at(0));

        let small = Dimensions::new(2, 2).unwrap();
        assert_eq!(session.change_difficulty(small, 2, at(1)).deck().len(), 4);
        assert_eq!(session.difficulty(), small);
        assert_eq!(session.persistence().load_difficulty(at(1)), Some(small));
    }

    #[test]
    fn mismatch_then_conceal_and_move_counters() {
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        session.start(8, at(0));
        let engine = session.engine().unwrap().clone();
        let other = mismatch_of(&engine, 0);

        session.flip(0, at(0)).unwrap();
        let transition = session.flip(other, at(0)).unwrap();
        assert!(transition.outcome.needs_conceal());
        assert_eq!(transition.move_count, 1);
        assert_eq!(session.cross_tab_total(), 1);

        let concealed = session.conceal(at(1));
        assert_eq!(concealed.outcome, FlipOutcome::Concealed);
        let engine = session.engine().unwrap();
        assert!(engine.pending().is_empty());
        assert_eq!(engine.matched_count(), 0);

        // the concealed state is what got saved
        let saved = Persistence::new(store).load(at(1)).unwrap();
        assert!(saved.revealed.is_empty());
    }

    #[test]
    fn playing_to_the_end_wins_and_stops_the_clock() {
        let mut session = GameSession::new(MemoryStore::new());
        session.change_difficulty(Dimensions::new(2, 2).unwrap(), 3, at(0));

        for index in 0..4 {
            let engine = session.engine().unwrap();
            if engine.face_at(index).is_shown() {
                continue;
            }
            let partner = partner_of(engine, index);
            session.flip(index, at(1)).unwrap();
            session.flip(partner, at(1)).unwrap();
        }

        assert_eq!(session.phase(), SessionPhase::Won);
        assert_eq!(session.engine().unwrap().move_count(), 2);
        assert_eq!(session.tick(at(2)), None);
        assert_eq!(session.cross_tab_total(), 2);
    }

    #[test]
    fn other_sessions_observe_total_moves() {
        let store = MemoryStore::new();
        let watcher = GameSession::new(store.connect());
        let mut player = GameSession::new(store);
        let seen = Rc::new(Cell::new(0));

        let _subscription = {
            let seen = Rc::clone(&seen);
            watcher.observe_cross_tab_moves(move |total| seen.set(total))
        };
        player.start(2, at(0));
        let other = mismatch_of(player.engine().unwrap(), 0);
        player.flip(0, at(0)).unwrap();
        player.flip(other, at(0)).unwrap();

        assert_eq!(seen.get(), 1);
        assert_eq!(watcher.cross_tab_total(), 1);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn session_resumes_on_wasm() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let store = MemoryStore::new();
        let mut session = GameSession::new(store.connect());
        session.change_difficulty(Dimensions::new(2, 2).unwrap(), 11, now);
        session.flip(0, now).unwrap();

        let mut reloaded = GameSession::new(store);
        let engine = reloaded.start(12, now);
        assert_eq!(engine.dimensions(), Dimensions::new(2, 2).unwrap());
        assert_eq!(engine.pending(), &[0]);
    }
}
