//! Session controller.
//!
//! Owns the single live [`GameState`] and orchestrates the engine and the
//! save store across the game lifecycle: new game, load, resume, round
//! advance, end. Every mutation goes through here, one at a time, and
//! each one is persisted and then broadcast to the registered observers
//! as a read-only snapshot.
//!
//! # State Diagram
//!
//! ```text
//! ┌────────┐  new_game / load_game(ok) / resume(ok)   ┌──────────────────┐
//! │ NoGame │─────────────────────────────────────────▶│ Active(save_name)│
//! └────────┘                                          └────────┬─────────┘
//!     ▲                                                        │
//!     │              end_game / load_game(failed)              │
//!     └────────────────────────────────────────────────────────┘
//! ```
//!
//! Draw, toggle and round advance keep the slot `Active`; they are silent
//! no-ops in `NoGame`.

use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use super::game::{GameSettings, GameState};
use super::store::{SaveStore, StoreError};

/// Receives the full game state after every mutation.
///
/// Implemented for any `Fn(&GameState)` closure.
pub trait StateObserver {
    fn state_changed(&self, state: &GameState);
}

impl<F: Fn(&GameState)> StateObserver for F {
    fn state_changed(&self, state: &GameState) {
        self(state)
    }
}

/// Handle identifying one subscription, used to unsubscribe or to request
/// an initial snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// The one conceptual "active game" slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ActiveGame {
    /// No game in progress; mutation commands are ignored
    #[default]
    NoGame,

    /// A game is in progress and persisted under `save_name`
    Active { save_name: String },
}

/// Orchestrates engine, store and observers for one caller display.
pub struct Session {
    state: GameState,
    active: ActiveGame,
    store: SaveStore,
    settings: GameSettings,
    rng: StdRng,
    observers: HashMap<u64, Box<dyn StateObserver>>,
    next_observer_id: u64,
    // Tie-break for save names generated within the same millisecond
    last_name_stamp: String,
    last_name_seq: u32,
}

impl Session {
    /// Create a session with an entropy-seeded draw source.
    pub fn new(store: SaveStore, settings: GameSettings) -> Self {
        Self::with_rng(store, settings, StdRng::from_entropy())
    }

    /// Create a session with an explicit draw source, for deterministic
    /// replay and tests.
    pub fn with_rng(store: SaveStore, settings: GameSettings, rng: StdRng) -> Self {
        let state = GameState::new(&settings);
        Self {
            state,
            active: ActiveGame::NoGame,
            store,
            settings,
            rng,
            observers: HashMap::new(),
            next_observer_id: 0,
            last_name_stamp: String::new(),
            last_name_seq: 0,
        }
    }

    /// Current game state snapshot.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Whether a game is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.active, ActiveGame::Active { .. })
    }

    /// Save name of the active game, if any.
    pub fn active_save_name(&self) -> Option<&str> {
        match &self.active {
            ActiveGame::Active { save_name } => Some(save_name),
            ActiveGame::NoGame => None,
        }
    }

    /// Replace the settings snapshot used for the next game. The running
    /// game, if any, keeps the snapshot it was started with.
    pub fn set_settings(&mut self, settings: GameSettings) {
        self.settings = settings;
    }

    // -- Observers -----------------------------------------------------

    /// Register an observer; it will receive every state change until
    /// unsubscribed.
    pub fn subscribe(&mut self, observer: impl StateObserver + 'static) -> ObserverHandle {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        self.observers.insert(id, Box::new(observer));
        ObserverHandle(id)
    }

    /// Remove an observer. Returns false if the handle was already gone.
    pub fn unsubscribe(&mut self, handle: ObserverHandle) -> bool {
        self.observers.remove(&handle.0).is_some()
    }

    /// Push the current state to one observer, e.g. a freshly opened
    /// display window catching up.
    pub fn request_initial_state(&self, handle: ObserverHandle) {
        if let Some(observer) = self.observers.get(&handle.0) {
            observer.state_changed(&self.state);
        }
    }

    // -- Lifecycle -----------------------------------------------------

    /// Start a brand-new game: fresh state from the current settings,
    /// saved under a newly generated name.
    pub fn new_game(&mut self) {
        self.state = GameState::new(&self.settings);
        let save_name = self.next_save_name();
        debug!(%save_name, "starting new game");
        self.active = ActiveGame::Active { save_name };
        self.persist_active();
        self.notify();
    }

    /// Load the save stored under `name`.
    ///
    /// On failure the session falls back to a freshly initialized state
    /// with no active game, never a half-loaded one. Observers are
    /// notified either way.
    pub fn load_game(&mut self, name: &str) -> bool {
        let loaded = match self.store.load(name) {
            Ok(state) => {
                self.state = state;
                self.active = ActiveGame::Active {
                    save_name: name.to_string(),
                };
                true
            }
            Err(e) => {
                warn!(name, error = %e, "failed to load game, resetting");
                self.state = GameState::new(&self.settings);
                self.active = ActiveGame::NoGame;
                false
            }
        };
        self.notify();
        loaded
    }

    /// Resume the most recently saved game, if the pointer still resolves
    /// to a loadable save.
    ///
    /// Unlike [`load_game`](Self::load_game), failure leaves the session
    /// untouched and notifies nobody; the caller typically falls back to
    /// its menu.
    pub fn resume_last_game(&mut self) -> bool {
        let Some(name) = self.store.last_save_name() else {
            return false;
        };

        match self.store.load(&name) {
            Ok(state) => {
                self.state = state;
                self.active = ActiveGame::Active { save_name: name };
                self.notify();
                true
            }
            Err(e) => {
                debug!(%name, error = %e, "last save is not resumable");
                false
            }
        }
    }

    /// End the active game, deleting its save and resetting to a fresh
    /// state with no game in progress.
    pub fn end_game(&mut self) {
        if let ActiveGame::Active { save_name } = std::mem::take(&mut self.active) {
            if let Err(e) = self.store.delete(&save_name) {
                warn!(%save_name, error = %e, "failed to delete save on game end");
            }
        }
        self.state = GameState::new(&self.settings);
        self.notify();
    }

    // -- In-game commands ----------------------------------------------

    /// Call the next number. No-op when no game is active.
    pub fn draw_next(&mut self) {
        if !self.is_active() {
            return;
        }
        self.state = self.state.draw_next(&mut self.rng);
        self.persist_active();
        self.notify();
    }

    /// Toggle a number's called state. No-op when no game is active.
    pub fn toggle_number(&mut self, number: u32) {
        if !self.is_active() {
            return;
        }
        self.state = self.state.toggle(number);
        self.persist_active();
        self.notify();
    }

    /// Advance to the next round. No-op when no game is active.
    pub fn advance_round(&mut self) {
        if !self.is_active() {
            return;
        }
        self.state = self.state.advance_round();
        self.persist_active();
        self.notify();
    }

    // -- Save management -----------------------------------------------

    /// List all stored save names.
    pub fn list_save_games(&self) -> Result<Vec<String>, StoreError> {
        self.store.list()
    }

    /// Delete a stored save. The active game's in-memory state is not
    /// affected even if its own save is removed.
    pub fn delete_save_game(&mut self, name: &str) -> Result<(), StoreError> {
        self.store.delete(name)
    }

    /// Remove every save and the resume pointer. Full data reset only.
    pub fn delete_all_saves(&mut self) -> Result<(), StoreError> {
        self.store.delete_all()
    }

    // -- Internals -----------------------------------------------------

    /// Persist the current state under the active save name. A write
    /// failure is logged and the in-memory state stays authoritative, so
    /// the running game survives a temporarily unavailable disk.
    fn persist_active(&mut self) {
        if let ActiveGame::Active { save_name } = &self.active {
            if let Err(e) = self.store.save(save_name, &self.state) {
                warn!(%save_name, error = %e, "failed to persist game state, continuing in memory");
            }
        }
    }

    fn notify(&self) {
        for observer in self.observers.values() {
            observer.state_changed(&self.state);
        }
    }

    /// Generate a unique timestamp-derived save name. Names generated
    /// within the same millisecond get a sequence suffix.
    fn next_save_name(&mut self) -> String {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3f").to_string();
        if stamp == self.last_name_stamp {
            self.last_name_seq += 1;
            format!("game-{}-{}.json", stamp, self.last_name_seq)
        } else {
            self.last_name_stamp = stamp.clone();
            self.last_name_seq = 0;
            format!("game-{}.json", stamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn session_in(dir: &tempfile::TempDir, seed: u64) -> Session {
        let store = SaveStore::new(dir.path()).unwrap();
        Session::with_rng(
            store,
            GameSettings::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    /// Subscribe an observer that records every snapshot it receives.
    fn recording_observer(session: &mut Session) -> (ObserverHandle, Rc<RefCell<Vec<GameState>>>) {
        let log: Rc<RefCell<Vec<GameState>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let handle = session.subscribe(move |state: &GameState| {
            sink.borrow_mut().push(state.clone());
        });
        (handle, log)
    }

    #[test]
    fn test_new_game_creates_save_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 1);

        assert!(!session.is_active());
        session.new_game();

        assert!(session.is_active());
        assert_eq!(session.state().round, 1);
        assert_eq!(session.state().remaining(), 90);

        let saves = session.list_save_games().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(session.active_save_name(), Some(saves[0].as_str()));
    }

    #[test]
    fn test_commands_are_noops_without_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 1);
        let (_handle, log) = recording_observer(&mut session);

        session.draw_next();
        session.toggle_number(5);
        session.advance_round();

        assert_eq!(session.state().called_count(), 0);
        assert_eq!(session.state().round, 1);
        assert!(session.list_save_games().unwrap().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_draw_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 2);
        let (_handle, log) = recording_observer(&mut session);

        session.new_game();
        session.draw_next();

        assert_eq!(session.state().called_count(), 1);
        assert_eq!(log.borrow().len(), 2); // new_game + draw
        assert_eq!(log.borrow().last().unwrap(), session.state());

        // The on-disk snapshot matches the in-memory state.
        let name = session.active_save_name().unwrap().to_string();
        let store = SaveStore::new(dir.path()).unwrap();
        assert_eq!(&store.load(&name).unwrap(), session.state());
    }

    #[test]
    fn test_toggle_through_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 3);
        session.new_game();

        session.toggle_number(5);
        assert!(session.state().is_called(5));
        assert_eq!(session.state().last_called, Some(5));

        session.toggle_number(5);
        assert!(!session.state().is_called(5));
        assert_eq!(session.state().last_called, None);
    }

    #[test]
    fn test_load_failure_falls_back_to_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 4);
        session.new_game();
        session.draw_next();
        session.draw_next();
        let (_handle, log) = recording_observer(&mut session);

        assert!(!session.load_game("missing.json"));

        // Fallback: fresh state, no active game, observers told.
        assert!(!session.is_active());
        assert_eq!(session.state().called_count(), 0);
        assert_eq!(log.borrow().len(), 1);

        // And mutation commands stay inert until a new game starts.
        session.draw_next();
        assert_eq!(session.state().called_count(), 0);
    }

    #[test]
    fn test_load_game_restores_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let (name, saved) = {
            let mut session = session_in(&dir, 5);
            session.new_game();
            for _ in 0..7 {
                session.draw_next();
            }
            let name = session.active_save_name().unwrap().to_string();
            (name, session.state().clone())
        };

        // Fresh session, as after an app restart.
        let mut session = session_in(&dir, 6);
        assert!(session.load_game(&name));
        assert!(session.is_active());
        assert_eq!(session.active_save_name(), Some(name.as_str()));
        assert_eq!(session.state(), &saved);
    }

    #[test]
    fn test_resume_last_game() {
        let dir = tempfile::tempdir().unwrap();
        let played = {
            let mut session = session_in(&dir, 6);
            session.new_game();
            for _ in 0..10 {
                session.draw_next();
            }
            session.state().clone()
        };

        // A new session over the same data dir picks up where we left off.
        let mut session = session_in(&dir, 7);
        let (_handle, log) = recording_observer(&mut session);
        assert!(session.resume_last_game());
        assert!(session.is_active());
        assert_eq!(session.state(), &played);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_resume_without_pointer_is_silent_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 8);
        let (_handle, log) = recording_observer(&mut session);

        assert!(!session.resume_last_game());
        assert!(!session.is_active());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_resume_with_dangling_pointer_is_silent_failure() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = session_in(&dir, 9);
            session.new_game();
        }

        // Delete the save behind the pointer's back.
        let store = SaveStore::new(dir.path()).unwrap();
        let name = store.last_save_name().unwrap();
        store.delete(&name).unwrap();

        let mut session = session_in(&dir, 10);
        let before = session.state().clone();
        let (_handle, log) = recording_observer(&mut session);

        assert!(!session.resume_last_game());
        assert_eq!(session.state(), &before);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_end_game_deletes_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 11);
        session.new_game();
        let name = session.active_save_name().unwrap().to_string();
        assert!(session.list_save_games().unwrap().contains(&name));

        let (_handle, log) = recording_observer(&mut session);
        session.end_game();

        assert!(!session.is_active());
        assert!(session.list_save_games().unwrap().is_empty());
        assert_eq!(session.state().called_count(), 0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_advance_round_resets_pool_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 12);
        session.new_game();
        for _ in 0..20 {
            session.draw_next();
        }

        session.advance_round();

        assert_eq!(session.state().round, 2);
        assert_eq!(session.state().called_count(), 0);
        assert_eq!(session.state().remaining(), 90);

        let name = session.active_save_name().unwrap().to_string();
        let store = SaveStore::new(dir.path()).unwrap();
        assert_eq!(store.load(&name).unwrap().round, 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 13);
        let (handle, log) = recording_observer(&mut session);

        session.new_game();
        assert_eq!(log.borrow().len(), 1);

        assert!(session.unsubscribe(handle));
        session.draw_next();
        assert_eq!(log.borrow().len(), 1);

        // Double unsubscribe reports the handle as gone.
        assert!(!session.unsubscribe(handle));
    }

    #[test]
    fn test_request_initial_state_reaches_one_observer() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 14);
        session.new_game();

        let (first, first_log) = recording_observer(&mut session);
        let (_second, second_log) = recording_observer(&mut session);

        session.request_initial_state(first);

        assert_eq!(first_log.borrow().len(), 1);
        assert_eq!(first_log.borrow()[0], *session.state());
        assert!(second_log.borrow().is_empty());
    }

    #[test]
    fn test_rapid_new_games_get_unique_save_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 15);

        // Old saves are not deleted by starting another game, so each
        // call must mint a distinct name even within one millisecond.
        for _ in 0..5 {
            session.new_game();
        }

        let names: HashSet<String> = session.list_save_games().unwrap().into_iter().collect();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_settings_apply_to_next_game_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 16);
        session.new_game();

        session.set_settings(GameSettings::new(75, "SPRING BINGO"));

        // The running game keeps its snapshot.
        assert_eq!(session.state().max_number, 90);
        session.advance_round();
        assert_eq!(session.state().max_number, 90);

        session.new_game();
        assert_eq!(session.state().max_number, 75);
        assert_eq!(session.state().game_title, "SPRING BINGO");
        assert_eq!(session.state().remaining(), 75);
    }

    #[test]
    fn test_delete_all_saves_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir, 17);
        session.new_game();
        session.new_game();

        session.delete_all_saves().unwrap();

        assert!(session.list_save_games().unwrap().is_empty());
        let store = SaveStore::new(dir.path()).unwrap();
        assert_eq!(store.last_save_name(), None);
    }
}
