//! Bingo Caller State Library
//!
//! This crate provides the game state engine and persistence for a live
//! bingo calling display.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Game State Engine** - Non-repeating random draws from the number
//!   pool, manual call corrections, and multi-round play, with the
//!   called/uncalled partition invariant enforced by every transition.
//!
//! - **Save Store** - One JSON snapshot per save name plus a last-save
//!   pointer, so an interrupted game can be resumed across sessions.
//!
//! - **Session Controller** - Owns the single live game, persists every
//!   mutation, and pushes full-state snapshots to registered observers
//!   (display windows, control panels).
//!
//! # Design Principles
//!
//! 1. **Value-based transitions** - Engine operations return a new state
//!    rather than mutating in place; the session swaps it in atomically.
//!
//! 2. **The running game stays playable** - A failed save is logged and
//!    the in-memory state remains authoritative; a failed load falls back
//!    to a fresh state, never a half-loaded one.
//!
//! 3. **No presentation** - This crate is pure state, no windowing or
//!    markup; observers receive read-only snapshots over a narrow trait.
//!
//! # Example
//!
//! ```no_run
//! use bingo_caller_state::state::{GameSettings, SaveStore, Session};
//!
//! let store = SaveStore::new("/tmp/bingo-data").unwrap();
//! let mut session = Session::new(store, GameSettings::default());
//!
//! let handle = session.subscribe(|state: &bingo_caller_state::GameState| {
//!     println!("{} called, last: {:?}", state.called_count(), state.last_called);
//! });
//!
//! session.new_game();
//! session.draw_next();
//! session.draw_next();
//!
//! session.unsubscribe(handle);
//! session.end_game();
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
