//! Save-slot discovery and serialization helpers.
//!
//! Saves are whole-state documents: writing a slot replaces the file,
//! loading or importing replaces the whole playthrough state. Nothing is
//! ever merged partially. Slots are keyed by story id; slot 0 is reserved
//! for auto-save.

use crate::state::{GameState, now_rfc3339};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SAVE_DIR: &str = "saved_games";

/// Slot reserved for auto-save.
pub const AUTO_SAVE_SLOT: u32 = 0;

/// Portable save document: the whole game state plus provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDoc {
    #[serde(flatten)]
    pub state: GameState,
    #[serde(default)]
    pub config_version: String,
    #[serde(default)]
    pub saved_at: String,
}

/// One discovered save slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlotInfo {
    pub slot: u32,
    pub day: u32,
    pub saved_at: String,
    pub path: PathBuf,
}

/// Why an imported save document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("save belongs to story '{found}', but '{expected}' is loaded")]
    StoryMismatch { expected: String, found: String },
    #[error("malformed save document: {0}")]
    Malformed(String),
}

/// Per-story save directory under a root.
pub fn save_dir_for_story(root: &Path, story_id: &str) -> PathBuf {
    root.join(story_id)
}

fn slot_file_name(story_id: &str, slot: u32) -> String {
    format!("{story_id}_slot{slot}.json")
}

/// Serialize state into a portable save document.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_state(state: &GameState, config_version: &str) -> Result<String> {
    let doc = SaveDoc {
        state: state.clone(),
        config_version: config_version.to_string(),
        saved_at: now_rfc3339(),
    };
    serde_json::to_string_pretty(&doc).context("serializing save document")
}

/// Parse a portable save document, rejecting saves from other stories.
///
/// The document is parsed in full before anything is returned, so a failed
/// import never leaves the caller with partial state.
///
/// # Errors
/// - [`ImportError::Malformed`] when the document fails to parse
/// - [`ImportError::StoryMismatch`] when the save is for another story
pub fn import_state(raw: &str, expected_story_id: &str) -> Result<GameState, ImportError> {
    let doc: SaveDoc = serde_json::from_str(raw).map_err(|err| ImportError::Malformed(err.to_string()))?;
    if doc.state.story_id != expected_story_id {
        return Err(ImportError::StoryMismatch {
            expected: expected_story_id.to_string(),
            found: doc.state.story_id,
        });
    }
    Ok(doc.state)
}

/// Write a save slot, replacing any existing file for that slot.
///
/// # Errors
/// Returns an error if the directory cannot be created or the file written.
pub fn save_to_slot(state: &GameState, config_version: &str, dir: &Path, slot: u32) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(slot_file_name(&state.story_id, slot));
    let raw = export_state(state, config_version)?;
    fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
    info!("saved story '{}' day {} to slot {slot}", state.story_id, state.current_day);
    Ok(path)
}

/// Load a save slot from disk.
///
/// # Errors
/// Returns an error if the file is missing, unreadable, malformed, or
/// belongs to a different story.
pub fn load_from_slot(dir: &Path, story_id: &str, slot: u32) -> Result<GameState> {
    let path = dir.join(slot_file_name(story_id, slot));
    let raw = fs::read_to_string(&path).with_context(|| format!("reading save file {}", path.display()))?;
    import_state(&raw, story_id).with_context(|| format!("parsing save file {}", path.display()))
}

/// Discover populated save slots for a story, auto-save slot included.
///
/// Unreadable or malformed slot files are skipped with a warning rather
/// than failing the listing.
///
/// # Errors
/// Returns an error only if the directory itself cannot be enumerated.
pub fn list_saves(dir: &Path, story_id: &str, max_slots: u32) -> Result<Vec<SaveSlotInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut slots = Vec::new();
    for slot in AUTO_SAVE_SLOT..=max_slots {
        let path = dir.join(slot_file_name(story_id, slot));
        if !path.is_file() {
            continue;
        }
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to read save slot {slot} ({}): {err}", path.display());
                continue;
            },
        };
        match serde_json::from_str::<SaveDoc>(&raw) {
            Ok(doc) => slots.push(SaveSlotInfo {
                slot,
                day: doc.state.current_day,
                saved_at: doc.saved_at,
                path,
            }),
            Err(err) => {
                warn!("failed to parse save slot {slot} ({}): {err}", path.display());
            },
        }
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragments_data::FlagValue;
    use tempfile::tempdir;

    fn build_test_state() -> GameState {
        let mut state = GameState {
            story_id: "demo".into(),
            current_day: 3,
            ..GameState::default()
        };
        state.stats.insert("honor".into(), 70);
        state.flags.insert("visited_market".into(), FlagValue::Bool(true));
        state.inventory.money = 12;
        state.inventory.items.insert("map".into());
        state.completed_events.push("intro".into());
        state
    }

    #[test]
    fn export_then_import_round_trips_identical_state() {
        let state = build_test_state();
        let raw = export_state(&state, "1.0").unwrap();
        let back = import_state(&raw, "demo").unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn import_rejects_foreign_story_saves() {
        let state = build_test_state();
        let raw = export_state(&state, "1.0").unwrap();
        let err = import_state(&raw, "other").unwrap_err();
        assert!(matches!(err, ImportError::StoryMismatch { .. }));
    }

    #[test]
    fn import_rejects_malformed_documents() {
        let err = import_state("not json", "demo").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
        let err = import_state(r#"{"saved_at": "now"}"#, "demo").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
    }

    #[test]
    fn slot_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let state = build_test_state();
        let path = save_to_slot(&state, "1.0", dir.path(), 1).unwrap();
        assert!(path.is_file());
        let back = load_from_slot(dir.path(), "demo", 1).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn loading_an_empty_slot_fails() {
        let dir = tempdir().unwrap();
        assert!(load_from_slot(dir.path(), "demo", 2).is_err());
    }

    #[test]
    fn list_saves_handles_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(list_saves(&missing, "demo", 3).unwrap().is_empty());
    }

    #[test]
    fn list_saves_reports_slots_and_skips_corrupt_files() {
        let dir = tempdir().unwrap();
        let state = build_test_state();
        save_to_slot(&state, "1.0", dir.path(), AUTO_SAVE_SLOT).unwrap();
        save_to_slot(&state, "1.0", dir.path(), 2).unwrap();
        fs::write(dir.path().join(slot_file_name("demo", 3)), "corrupt").unwrap();

        let slots = list_saves(dir.path(), "demo", 3).unwrap();
        let numbers: Vec<_> = slots.iter().map(|slot| slot.slot).collect();
        assert_eq!(numbers, vec![0, 2]);
        assert_eq!(slots[0].day, 3);
    }
}
