//! Leaderboard records, retention policy and backend abstraction
//!
//! Backends come in two shapes:
//! - get-all/put-all stores ([`RecordStore`]) where this module applies the
//!   retention and ranking policy itself ([`LocalLeaderboard`])
//! - get/post services that apply the same policy server-side
//!   (see `remote` and `service`)

use crate::scoring::Victory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Records kept after each insertion
pub const MAX_ENTRIES: usize = 50;

/// One submitted score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub nickname: String,
    pub score: u32,
    /// Grid label such as `6x6`
    pub difficulty: String,
    /// Time taken as MM:SS
    pub time: String,
    /// Submission date as YYYY-MM-DD
    pub date: String,
    /// Status label derived from the score
    pub emotion: String,
    /// Creation time in ms since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl ScoreRecord {
    /// Build a record for a win; `nickname` must already be validated
    pub fn from_victory(nickname: String, victory: &Victory, timestamp_ms: u64) -> Self {
        Self {
            nickname,
            score: victory.score,
            difficulty: crate::difficulty::difficulty_label(victory.grid_size),
            time: victory.time_string(),
            date: format_date(timestamp_ms),
            emotion: victory.status.label().to_string(),
            timestamp: timestamp_ms,
        }
    }
}

/// Calendar date (UTC) of a Unix timestamp in milliseconds
pub fn format_date(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Result type for leaderboard operations
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

/// Errors that can occur during leaderboard operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    /// Nickname empty after trimming
    InvalidNickname,
    /// A submission is already in flight
    SubmissionPending,
    /// No finished game to submit, or it was already submitted
    NothingToSubmit,
    /// Network/connection error
    NetworkError(String),
    /// Server returned an error
    ServerError(String),
    /// Invalid response from server
    InvalidResponse(String),
    /// Local storage error
    StorageError(String),
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNickname => write!(f, "Nickname is not valid"),
            Self::SubmissionPending => write!(f, "A submission is already in progress"),
            Self::NothingToSubmit => write!(f, "There is no score to submit"),
            Self::NetworkError(e) => write!(f, "Network error: {}", e),
            Self::ServerError(e) => write!(f, "Server error: {}", e),
            Self::InvalidResponse(e) => write!(f, "Invalid response: {}", e),
            Self::StorageError(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for LeaderboardError {}

/// Trimmed nickname, or an error when nothing is left
pub fn validate_nickname(raw: &str) -> LeaderboardResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(LeaderboardError::InvalidNickname)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Keep the `cap` most recently created records (newest first)
pub fn retain_recent(records: &mut Vec<ScoreRecord>, cap: usize) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(cap);
}

/// Order by score, highest first; ties keep their relative order
pub fn rank_by_score(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Add a record, apply retention, then rank
///
/// The new record goes in front so it outlives stored records that share
/// its timestamp.
pub fn insert_record(mut records: Vec<ScoreRecord>, record: ScoreRecord, cap: usize) -> Vec<ScoreRecord> {
    records.insert(0, record);
    retain_recent(&mut records, cap);
    rank_by_score(&mut records);
    records
}

/// Parse a stored JSON array; malformed data reads as an empty board
pub fn parse_records(json: &str) -> Vec<ScoreRecord> {
    match serde_json::from_str(json) {
        Ok(records) => records,
        Err(e) => {
            log::warn!("discarding malformed leaderboard data: {}", e);
            Vec::new()
        }
    }
}

/// A record with its 1-based rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// What the leaderboard screen shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum LeaderboardView {
    Empty,
    Ranked(Vec<RankedEntry>),
}

impl LeaderboardView {
    /// Wrap an already ranked list
    pub fn from_ranked(records: Vec<ScoreRecord>) -> Self {
        if records.is_empty() {
            return Self::Empty;
        }
        Self::Ranked(
            records
                .into_iter()
                .enumerate()
                .map(|(i, record)| RankedEntry { rank: i + 1, record })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[RankedEntry] {
        match self {
            Self::Empty => &[],
            Self::Ranked(entries) => entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Trait for leaderboard backends
pub trait LeaderboardBackend: Send + Sync {
    /// Current ranked, capped list
    fn fetch(&self) -> LeaderboardResult<Vec<ScoreRecord>>;

    /// Persist a record and return the updated ranked list
    fn submit(&self, record: ScoreRecord) -> LeaderboardResult<Vec<ScoreRecord>>;

    /// Check if backend is available/connected
    fn is_available(&self) -> bool;

    /// Get backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Raw get-all/put-all persistence
pub trait RecordStore: Send + Sync {
    fn load(&self) -> LeaderboardResult<Vec<ScoreRecord>>;
    fn save(&self, records: &[ScoreRecord]) -> LeaderboardResult<()>;
    fn is_available(&self) -> bool {
        true
    }
    fn store_name(&self) -> &'static str;
}

/// Applies the retention and ranking policy over a [`RecordStore`]
pub struct LocalLeaderboard<S> {
    store: S,
    cap: usize,
}

impl<S: RecordStore> LocalLeaderboard<S> {
    pub fn new(store: S) -> Self {
        Self::with_cap(store, MAX_ENTRIES)
    }

    pub fn with_cap(store: S, cap: usize) -> Self {
        Self { store, cap }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RecordStore> LeaderboardBackend for LocalLeaderboard<S> {
    fn fetch(&self) -> LeaderboardResult<Vec<ScoreRecord>> {
        let mut records = self.store.load()?;
        retain_recent(&mut records, self.cap);
        rank_by_score(&mut records);
        Ok(records)
    }

    fn submit(&self, record: ScoreRecord) -> LeaderboardResult<Vec<ScoreRecord>> {
        let records = insert_record(self.store.load()?, record, self.cap);
        self.store.save(&records)?;
        Ok(records)
    }

    fn is_available(&self) -> bool {
        self.store.is_available()
    }

    fn backend_name(&self) -> &'static str {
        self.store.store_name()
    }
}

// ==================== In-memory store ====================

/// In-memory store for tests and headless use
pub struct MemoryStore {
    records: Mutex<Vec<ScoreRecord>>,
    available: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            available: Mutex::new(true),
        }
    }

    /// Set whether the store should report as available
    pub fn set_available(&self, available: bool) {
        if let Ok(mut flag) = self.available.lock() {
            *flag = available;
        }
    }

    /// Get entry count
    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn check_available(&self) -> LeaderboardResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(LeaderboardError::NetworkError("Memory store unavailable".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> LeaderboardResult<Vec<ScoreRecord>> {
        self.check_available()?;
        self.records
            .lock()
            .map(|r| r.clone())
            .map_err(|e| LeaderboardError::StorageError(e.to_string()))
    }

    fn save(&self, records: &[ScoreRecord]) -> LeaderboardResult<()> {
        self.check_available()?;
        let mut stored = self
            .records
            .lock()
            .map_err(|e| LeaderboardError::StorageError(e.to_string()))?;
        *stored = records.to_vec();
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.lock().map(|a| *a).unwrap_or(false)
    }

    fn store_name(&self) -> &'static str {
        "Memory"
    }
}

/// In-memory leaderboard for testing
pub type MockLeaderboard = LocalLeaderboard<MemoryStore>;

// ==================== Leaderboard Manager ====================

/// Primary backend with an optional fallback
pub struct LeaderboardManager {
    primary: Box<dyn LeaderboardBackend>,
    fallback: Option<Box<dyn LeaderboardBackend>>,
}

impl fmt::Debug for LeaderboardManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderboardManager")
            .field("primary", &self.primary.backend_name())
            .field(
                "fallback",
                &self.fallback.as_ref().map(|f| f.backend_name()),
            )
            .finish()
    }
}

impl LeaderboardManager {
    pub fn new(primary: Box<dyn LeaderboardBackend>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Set a fallback backend
    pub fn with_fallback(mut self, fallback: Box<dyn LeaderboardBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Get the active backend (primary if available, else fallback)
    fn active_backend(&self) -> &dyn LeaderboardBackend {
        match &self.fallback {
            Some(fallback) if !self.primary.is_available() => fallback.as_ref(),
            _ => self.primary.as_ref(),
        }
    }

    /// Submit a record; falls back when the primary fails
    pub fn submit(&self, record: ScoreRecord) -> LeaderboardResult<LeaderboardView> {
        let result = match self.primary.submit(record.clone()) {
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    log::warn!(
                        "{} leaderboard submit failed ({}), using {}",
                        self.primary.backend_name(),
                        e,
                        fallback.backend_name()
                    );
                    fallback.submit(record)
                }
                None => Err(e),
            },
            ok => ok,
        };
        result.map(LeaderboardView::from_ranked)
    }

    /// Ranked, capped list from the active backend
    pub fn list(&self) -> LeaderboardResult<LeaderboardView> {
        self.active_backend()
            .fetch()
            .map(LeaderboardView::from_ranked)
    }

    /// Get backend status info
    pub fn status(&self) -> LeaderboardStatus {
        LeaderboardStatus {
            backend_name: self.active_backend().backend_name(),
            is_available: self.primary.is_available(),
            using_fallback: !self.primary.is_available() && self.fallback.is_some(),
        }
    }
}

/// Status information about the leaderboard
#[derive(Debug, Clone)]
pub struct LeaderboardStatus {
    pub backend_name: &'static str,
    pub is_available: bool,
    pub using_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nickname: &str, score: u32, timestamp: u64) -> ScoreRecord {
        ScoreRecord {
            nickname: nickname.to_string(),
            score,
            difficulty: "4x4".to_string(),
            time: "01:00".to_string(),
            date: "2026-10-19".to_string(),
            emotion: "😐🤔 So-so".to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_nickname_validation() {
        assert_eq!(validate_nickname("  ace "), Ok("ace".to_string()));
        assert_eq!(validate_nickname(""), Err(LeaderboardError::InvalidNickname));
        assert_eq!(validate_nickname(" \t\n"), Err(LeaderboardError::InvalidNickname));
    }

    #[test]
    fn test_retention_keeps_most_recent_then_ranks() {
        let backend = MockLeaderboard::new(MemoryStore::new());
        let mut last = Vec::new();
        for i in 0..55u64 {
            // Older records get the higher scores so retention is visible
            last = backend.submit(record(&format!("p{}", i), 100 - i as u32, i)).unwrap();
        }

        assert_eq!(last.len(), 50);
        assert_eq!(backend.store().count(), 50);
        assert!(last.iter().all(|r| r.timestamp >= 5));
        assert!(last.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(last[0].nickname, "p5");
    }

    #[test]
    fn test_full_board_keeps_new_record_on_timestamp_tie() {
        let stored: Vec<_> = (0..MAX_ENTRIES)
            .map(|i| record(&format!("old{}", i), 90, 1_000))
            .collect();
        let records = insert_record(stored, record("new", 10, 1_000), MAX_ENTRIES);
        assert_eq!(records.len(), MAX_ENTRIES);
        assert_eq!(records.last().map(|r| r.nickname.as_str()), Some("new"));
        assert!(!records.iter().any(|r| r.nickname == "old49"));
    }

    #[test]
    fn test_rank_ties_are_stable() {
        let mut records = vec![record("a", 10, 1), record("b", 20, 2), record("c", 10, 3)];
        rank_by_score(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.nickname.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_malformed_data_reads_empty() {
        assert!(parse_records("{not json").is_empty());
        assert!(parse_records(r#"{"nickname": "x"}"#).is_empty());
        let parsed = parse_records(
            r#"[{"nickname":"x","score":5,"difficulty":"4x4","time":"00:10","date":"d","emotion":"e"}]"#,
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].timestamp, 0);
    }

    #[test]
    fn test_view_ranks_from_one() {
        assert_eq!(LeaderboardView::from_ranked(Vec::new()), LeaderboardView::Empty);
        let view = LeaderboardView::from_ranked(vec![record("a", 9, 0), record("b", 3, 0)]);
        let ranks: Vec<_> = view.entries().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2]);
    }

    #[test]
    fn test_manager_fallback() {
        let primary = MemoryStore::new();
        primary.set_available(false);
        let manager = LeaderboardManager::new(Box::new(MockLeaderboard::new(primary)))
            .with_fallback(Box::new(MockLeaderboard::new(MemoryStore::new())));

        let status = manager.status();
        assert!(status.using_fallback);
        assert!(!status.is_available);

        let view = manager.submit(record("a", 50, 1)).unwrap();
        assert_eq!(view.entries().len(), 1);
        assert_eq!(manager.list().unwrap().entries().len(), 1);
    }

    #[test]
    fn test_manager_without_fallback_surfaces_error() {
        let store = MemoryStore::new();
        store.set_available(false);
        let manager = LeaderboardManager::new(Box::new(MockLeaderboard::new(store)));
        assert!(matches!(
            manager.submit(record("a", 1, 1)),
            Err(LeaderboardError::NetworkError(_))
        ));
    }

    #[test]
    fn test_date_format() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(1_760_832_000_000), "2025-10-19");
    }
}
