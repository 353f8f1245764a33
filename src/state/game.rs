//! Game state engine.
//!
//! The authoritative record of one in-progress bingo game: which numbers
//! have been called, in what order, and what remains in the pool.
//!
//! Transitions are value-based: every operation takes `&self` and returns
//! a fresh `GameState`, so the session controller can swap its copy
//! atomically and hand read-only snapshots to observers.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default size of the number pool.
pub const DEFAULT_MAX_NUMBER: u32 = 90;

/// Default display title.
pub const DEFAULT_GAME_TITLE: &str = "BINGO";

/// Configuration snapshot consumed at game start.
///
/// Read once from the settings collaborator when a game begins and copied
/// onto the state. Never re-read mid-game, so settings edits only take
/// effect for the next game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Highest callable number (pool is `1..=max_number`)
    pub max_number: u32,

    /// Title shown on the caller display
    pub game_title: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_number: DEFAULT_MAX_NUMBER,
            game_title: DEFAULT_GAME_TITLE.to_string(),
        }
    }
}

impl GameSettings {
    pub fn new(max_number: u32, game_title: impl Into<String>) -> Self {
        Self {
            max_number,
            game_title: game_title.into(),
        }
    }
}

/// State of a single live bingo game.
///
/// Invariant: `called_numbers` and `uncalled_numbers` are disjoint and
/// together cover exactly `1..=max_number`, after every operation.
/// `called_numbers` is kept in call order; `uncalled_numbers` is kept
/// ascending for display.
///
/// Serializes to the camelCase JSON layout used by the save files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Numbers called this round, in call order
    pub called_numbers: Vec<u32>,

    /// Numbers still in the pool, ascending
    pub uncalled_numbers: Vec<u32>,

    /// Most recently called number, for display highlighting.
    /// `None` until the first call, or after that call is toggled off.
    pub last_called: Option<u32>,

    /// Current round, 1-based
    pub round: u32,

    /// True when a draw has emptied (or found empty) the pool.
    /// Set on the draw transition, never by toggles.
    pub is_game_over: bool,

    /// Pool size snapshot taken at game start
    pub max_number: u32,

    /// Title snapshot taken at game start
    pub game_title: String,
}

impl GameState {
    /// Create a fresh round-1 state from a settings snapshot.
    pub fn new(settings: &GameSettings) -> Self {
        Self::fresh(settings.max_number, settings.game_title.clone(), 1)
    }

    fn fresh(max_number: u32, game_title: String, round: u32) -> Self {
        Self {
            called_numbers: Vec::new(),
            uncalled_numbers: (1..=max_number).collect(),
            last_called: None,
            round,
            is_game_over: false,
            max_number,
            game_title,
        }
    }

    /// Draw one number uniformly at random from the uncalled pool.
    ///
    /// The drawn number is appended to the call history and becomes the
    /// last called. The draw that empties the pool flags the game over;
    /// draws on an already empty pool are no-ops beyond keeping the flag
    /// set.
    pub fn draw_next<R: Rng>(&self, rng: &mut R) -> Self {
        let mut next = self.clone();

        if next.uncalled_numbers.is_empty() {
            next.is_game_over = true;
            return next;
        }

        let index = rng.gen_range(0..next.uncalled_numbers.len());
        let number = next.uncalled_numbers.remove(index);
        next.called_numbers.push(number);
        next.last_called = Some(number);
        // Kept in sync with the pool on every draw, so a game reopened by
        // toggling numbers back out can continue past a stale flag.
        next.is_game_over = next.uncalled_numbers.is_empty();
        next
    }

    /// Manually move `number` to the other side of the called/uncalled
    /// partition.
    ///
    /// Out-of-range numbers are ignored. Uncalling removes the number
    /// from the history and reinserts it into the pool at its ascending
    /// position, clearing `last_called` if it pointed at that number.
    /// Calling appends it to the history as if it had just been drawn.
    /// Toggling never changes `is_game_over`.
    pub fn toggle(&self, number: u32) -> Self {
        if number < 1 || number > self.max_number {
            return self.clone();
        }

        let mut next = self.clone();

        if let Some(pos) = next.called_numbers.iter().position(|&n| n == number) {
            next.called_numbers.remove(pos);
            let at = match next.uncalled_numbers.binary_search(&number) {
                Ok(at) | Err(at) => at,
            };
            next.uncalled_numbers.insert(at, number);
            if next.last_called == Some(number) {
                next.last_called = None;
            }
        } else if let Some(pos) = next.uncalled_numbers.iter().position(|&n| n == number) {
            next.uncalled_numbers.remove(pos);
            next.called_numbers.push(number);
            next.last_called = Some(number);
        }

        next
    }

    /// Start the next round: same configuration snapshot, empty call
    /// history, round counter incremented.
    pub fn advance_round(&self) -> Self {
        Self::fresh(self.max_number, self.game_title.clone(), self.round + 1)
    }

    /// Numbers called so far this round.
    pub fn called_count(&self) -> usize {
        self.called_numbers.len()
    }

    /// Numbers still in the pool.
    pub fn remaining(&self) -> usize {
        self.uncalled_numbers.len()
    }

    /// Check whether `number` has been called this round.
    pub fn is_called(&self, number: u32) -> bool {
        self.called_numbers.contains(&number)
    }
}
