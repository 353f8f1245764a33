//! Save file persistence.
//!
//! Each save is one JSON snapshot of a [`GameState`] under the
//! `savegames/` directory, keyed by file name. A single pointer file,
//! `last_game.json`, remembers the most recently saved or loaded game so
//! the caller can offer "resume last game" on startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::game::GameState;

/// Directory holding one file per save, under the store's data dir.
pub const SAVES_DIR: &str = "savegames";

/// Pointer file holding the most recent save name.
pub const LAST_GAME_FILE: &str = "last_game.json";

/// Errors from the persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No save exists under the given name.
    #[error("save file not found: {name}")]
    NotFound { name: String },

    /// The save file exists but does not parse as a game state.
    /// The file is left untouched for inspection.
    #[error("save file {name} is corrupt: {source}")]
    Corrupt {
        name: String,
        source: serde_json::Error,
    },

    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Contents of the pointer file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastSaveInfo {
    last_save: String,
}

/// File-backed store of game state snapshots.
#[derive(Debug)]
pub struct SaveStore {
    saves_dir: PathBuf,
    last_save_path: PathBuf,
}

impl SaveStore {
    /// Open a store rooted at `data_dir`, creating the saves directory if
    /// needed.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        let saves_dir = data_dir.join(SAVES_DIR);
        fs::create_dir_all(&saves_dir)?;

        Ok(Self {
            saves_dir,
            last_save_path: data_dir.join(LAST_GAME_FILE),
        })
    }

    /// Write a snapshot under `name`, overwriting any existing save, and
    /// point the last-save marker at it.
    pub fn save(&self, name: &str, state: &GameState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
        fs::write(self.save_path(name), json)?;
        self.write_pointer(name)?;
        debug!(name, "saved game state");
        Ok(())
    }

    /// Read the snapshot stored under `name` and point the last-save
    /// marker at it.
    ///
    /// A missing file is [`StoreError::NotFound`]; an unparseable one is
    /// [`StoreError::Corrupt`] and is left on disk untouched.
    pub fn load(&self, name: &str) -> Result<GameState, StoreError> {
        let data = fs::read_to_string(self.save_path(name)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound {
                    name: name.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;

        let state = serde_json::from_str(&data).map_err(|source| StoreError::Corrupt {
            name: name.to_string(),
            source,
        })?;

        self.write_pointer(name)?;
        debug!(name, "loaded game state");
        Ok(state)
    }

    /// Remove the save under `name`. Removing a save that does not exist
    /// is not an error.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.save_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List every stored save name, in no guaranteed order.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.saves_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            if let Some(name) = name.to_str() {
                if name.ends_with(".json") {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Name of the most recently saved or loaded game, if any.
    ///
    /// Returns `None` when the pointer was never written or no longer
    /// parses; resume simply becomes unavailable in that case.
    pub fn last_save_name(&self) -> Option<String> {
        let data = fs::read_to_string(&self.last_save_path).ok()?;
        let info: LastSaveInfo = serde_json::from_str(&data).ok()?;
        Some(info.last_save)
    }

    /// Remove every save and the last-save pointer. The store remains
    /// usable afterwards.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.saves_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.saves_dir)?;

        match fs::remove_file(&self.last_save_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!("deleted all saves");
        Ok(())
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.saves_dir.join(name)
    }

    fn write_pointer(&self, name: &str) -> Result<(), StoreError> {
        let info = LastSaveInfo {
            last_save: name.to_string(),
        };
        let json = serde_json::to_string(&info).map_err(io::Error::other)?;
        fs::write(&self.last_save_path, json)?;
        Ok(())
    }
}
