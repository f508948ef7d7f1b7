//! Persisted state file: a JSON map of context name to adaptation state.
//!
//! Written by `save` commands and read at startup or by `load`. The default
//! context is stored under the empty name. A file holding a bare single
//! state object (no map wrapper) is accepted for compatibility and read as
//! the default context's state.
//!
//! All writes go through a [`StateStore`], which serializes the
//! read-modify-write cycle: contexts saving to the same file concurrently
//! would otherwise both read the old map and the later rename would drop
//! the earlier context's entry.

use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::StateError;
use crate::state::AdaptationState;

/// On-disk wrapper for one or more contexts' state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    contexts: BTreeMap<String, AdaptationState>,
}

/// Read all context states from a file.
///
/// Reads need no coordination with a [`StateStore`]: writes land via atomic
/// rename, so a reader always sees a complete file.
pub fn read_contexts(path: &Path) -> Result<BTreeMap<String, AdaptationState>, StateError> {
    let bytes = std::fs::read(path)?;
    match serde_json::from_slice::<StateFile>(&bytes) {
        Ok(file) => {
            debug!(path = %path.display(), contexts = file.contexts.len(), "state file loaded");
            Ok(file.contexts)
        }
        Err(_) => {
            // Bare single-context form
            let state: AdaptationState = serde_json::from_slice(&bytes)
                .map_err(|e| StateError::Corrupt(e.to_string()))?;
            let mut contexts = BTreeMap::new();
            let _ = contexts.insert(String::new(), state);
            Ok(contexts)
        }
    }
}

/// Writer handle for persisted state files.
///
/// One store guards all save traffic in a process; holding its lock across
/// the whole read-merge-write cycle is what keeps concurrent saves from
/// different contexts from losing each other's entries.
#[derive(Debug, Default)]
pub struct StateStore {
    write_lock: Mutex<()>,
}

impl StateStore {
    /// Create a store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write or update one context's entry in a state file.
    ///
    /// Existing entries for other contexts are preserved. The write goes
    /// through a sibling temp file and an atomic rename so a crash never
    /// leaves a truncated state file.
    pub fn save(&self, path: &Path, name: &str, state: &AdaptationState) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();

        let mut contexts = if path.exists() {
            read_contexts(path).unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        let _ = contexts.insert(name.to_owned(), state.clone());

        let file = StateFile { contexts };
        let bytes =
            serde_json::to_vec_pretty(&file).map_err(|e| StateError::Corrupt(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), context = name, "state saved");
        Ok(())
    }
}
