//! Leaderboard records in `window.localStorage`

use jigsaw_core::leaderboard::{parse_records, RecordStore};
use jigsaw_core::{LeaderboardError, LeaderboardResult, ScoreRecord};
use web_sys::Storage;

/// Storage key holding the JSON array of records
pub const LEADERBOARD_KEY: &str = "jigsawLeaderboard";

pub struct LocalStorageStore {
    key: String,
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new(LEADERBOARD_KEY)
    }
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> LeaderboardResult<Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| LeaderboardError::StorageError("localStorage unavailable".into()))
    }

    /// Drop every stored record
    pub fn clear(&self) -> LeaderboardResult<()> {
        Self::storage()?
            .remove_item(&self.key)
            .map_err(|e| LeaderboardError::StorageError(format!("{:?}", e)))
    }
}

impl RecordStore for LocalStorageStore {
    fn load(&self) -> LeaderboardResult<Vec<ScoreRecord>> {
        let stored = Self::storage()?
            .get_item(&self.key)
            .map_err(|e| LeaderboardError::StorageError(format!("{:?}", e)))?;
        Ok(stored.map(|json| parse_records(&json)).unwrap_or_default())
    }

    fn save(&self, records: &[ScoreRecord]) -> LeaderboardResult<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| LeaderboardError::StorageError(e.to_string()))?;
        Self::storage()?
            .set_item(&self.key, &json)
            .map_err(|e| LeaderboardError::StorageError(format!("{:?}", e)))
    }

    fn is_available(&self) -> bool {
        Self::storage().is_ok()
    }

    fn store_name(&self) -> &'static str {
        "Local"
    }
}
