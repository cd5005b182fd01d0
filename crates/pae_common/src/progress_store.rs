//! Progress persistence.
//!
//! The engine only sees the `ProgressStore` capability. `JsonFileStore` keeps
//! the tracker under a single fixed key on disk; `MemoryStore` is for tests
//! and throwaway sessions.

use crate::error::{PaeError, PaeResult};
use crate::progress::ProgressTracker;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Storage key; also the on-disk file stem
pub const STORAGE_KEY: &str = "protein_game_progress";

/// Load/save capability for the player's progress
pub trait ProgressStore: Send + Sync {
    /// Stored tracker, or `None` when nothing was saved yet
    fn load(&self) -> PaeResult<Option<ProgressTracker>>;

    /// Durably replace the stored tracker
    fn save(&self, tracker: &ProgressTracker) -> PaeResult<()>;
}

// ============================================================================
// JSON file store
// ============================================================================

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `<data_dir>/protein_game_progress.json`
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", STORAGE_KEY)),
        }
    }

    /// Store under the user's data directory (~/.local/share/pae-quest)
    pub fn default_location() -> PaeResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| PaeError::Store("cannot determine user data directory".to_string()))?;
        Ok(Self::new(&base.join("pae-quest")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> PaeResult<Option<ProgressTracker>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        let tracker = serde_json::from_str(&data).map_err(|e| {
            PaeError::Store(format!("corrupt progress file {}: {}", self.path.display(), e))
        })?;
        Ok(Some(tracker))
    }

    fn save(&self, tracker: &ProgressTracker) -> PaeResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(tracker)?;

        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved progress to {}", self.path.display());
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    tracker: Mutex<Option<ProgressTracker>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a tracker
    pub fn with_tracker(tracker: ProgressTracker) -> Self {
        Self {
            tracker: Mutex::new(Some(tracker)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> PaeResult<Option<ProgressTracker>> {
        let guard = self
            .tracker
            .lock()
            .map_err(|_| PaeError::Store("memory store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, tracker: &ProgressTracker) -> PaeResult<()> {
        let mut guard = self
            .tracker
            .lock()
            .map_err(|_| PaeError::Store("memory store lock poisoned".to_string()))?;
        *guard = Some(tracker.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_save_then_load() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(&dir.path().join("nested"));

        let mut tracker = ProgressTracker::default();
        tracker.level = 4;
        tracker.experience = 12;
        tracker.experience_to_next = 400;
        tracker.unlocked_achievement_ids.insert("first_steps".to_string());
        store.save(&tracker).unwrap();

        assert!(store.path().ends_with("protein_game_progress.json"));
        assert_eq!(store.load().unwrap(), Some(tracker));
    }

    #[test]
    fn test_file_store_uses_browser_field_names() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(&ProgressTracker::default()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"experienceToNext\""));
        assert!(raw.contains("\"unlockedAchievements\""));
        assert!(raw.contains("\"correctAnswers\""));
    }

    #[test]
    fn test_file_store_corrupt_is_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(PaeError::Store(_))));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&ProgressTracker::default()).unwrap();
        store.save(&ProgressTracker::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.load().unwrap().is_some());
    }
}
