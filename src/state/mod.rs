//! State management module for the bingo caller.
//!
//! This module provides the core state types and their orchestration:
//!
//! - `game` - Game state engine (number pool, draws, toggles, rounds)
//! - `store` - Save file persistence and the resume pointer
//! - `session` - Session controller tying engine, store and observers together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Session                              │
//! │                                                              │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐   │
//! │  │   GameState   │   │   SaveStore   │   │   Observers   │   │
//! │  │               │   │               │   │               │   │
//! │  │ called /      │   │ savegames/    │   │ handle →      │   │
//! │  │   uncalled    │   │   *.json      │   │   callback    │   │
//! │  │ last called   │   │               │   │               │   │
//! │  │ round,        │   │ last_game.json│   │ full-state    │   │
//! │  │   game over   │   │   (resume)    │   │   snapshots   │   │
//! │  └───────────────┘   └───────────────┘   └───────────────┘   │
//! │                                                              │
//! │  command ──▶ engine transition ──▶ save ──▶ notify all       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command flows through the session: the engine computes the next
//! state value, the store persists it under the active save name, and the
//! observers receive the new snapshot.

pub mod game;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use game::{GameSettings, GameState, DEFAULT_GAME_TITLE, DEFAULT_MAX_NUMBER};
pub use session::{ObserverHandle, Session, StateObserver};
pub use store::{SaveStore, StoreError, LAST_GAME_FILE, SAVES_DIR};
