//! Leaderboard backends for the terminal
//!
//! Supports different backends based on environment:
//! - Local: JSON file in the platform data directory
//! - Test: In-memory mock
//! - Remote: HTTP API over `ureq`, falling back to the local file
//!
//! Store calls run on a [`LeaderboardWorker`] thread so a slow server never
//! stalls the input loop.

use crate::config::BackendKind;
use jigsaw_core::leaderboard::{
    parse_records, LocalLeaderboard, MemoryStore, MockLeaderboard, RecordStore,
};
use jigsaw_core::remote::{HttpResponse, RemoteLeaderboard, Transport};
use jigsaw_core::{
    LeaderboardError, LeaderboardManager, LeaderboardResult, LeaderboardStatus, LeaderboardView,
    ScoreRecord,
};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

/// File name of the local leaderboard
pub const LEADERBOARD_FILE: &str = "jigsaw_leaderboard.json";

/// Environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development - file-based storage
    Local,
    /// Testing - in-memory mock
    Test,
    /// Production - remote API
    Production,
}

impl Environment {
    /// Detect environment from the JIGSAW_ENV variable
    pub fn detect() -> Self {
        Self::from_name(std::env::var("JIGSAW_ENV").ok().as_deref())
    }

    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Environment::Production,
            Some("test") | Some("testing") => Environment::Test,
            _ => Environment::Local,
        }
    }

    pub fn backend_kind(self) -> BackendKind {
        match self {
            Environment::Local => BackendKind::Local,
            Environment::Test => BackendKind::Test,
            Environment::Production => BackendKind::Remote,
        }
    }
}

// ==================== Local File Store ====================

/// Records persisted as a JSON array on disk
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<Vec<ScoreRecord>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Store in `dir`, creating the directory on first save
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LEADERBOARD_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> LeaderboardResult<std::sync::MutexGuard<'_, Option<Vec<ScoreRecord>>>> {
        self.cache
            .lock()
            .map_err(|_| LeaderboardError::StorageError("cache lock poisoned".to_string()))
    }
}

impl RecordStore for FileStore {
    fn load(&self) -> LeaderboardResult<Vec<ScoreRecord>> {
        let mut cache = self.lock()?;
        if let Some(ref records) = *cache {
            return Ok(records.clone());
        }

        let records = match std::fs::read_to_string(&self.path) {
            Ok(json) => parse_records(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(LeaderboardError::StorageError(e.to_string())),
        };

        *cache = Some(records.clone());
        Ok(records)
    }

    fn save(&self, records: &[ScoreRecord]) -> LeaderboardResult<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| LeaderboardError::StorageError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LeaderboardError::StorageError(e.to_string()))?;
        }
        std::fs::write(&self.path, json)
            .map_err(|e| LeaderboardError::StorageError(e.to_string()))?;

        *self.lock()? = Some(records.to_vec());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "Local"
    }
}

// ==================== HTTP Transport ====================

/// Blocking HTTP over `ureq`
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Error statuses still carry a body the codec wants to read
fn into_http(result: Result<ureq::Response, ureq::Error>) -> LeaderboardResult<HttpResponse> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => return Err(LeaderboardError::NetworkError(e.to_string())),
    };
    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| LeaderboardError::InvalidResponse(e.to_string()))?;
    Ok(HttpResponse::new(status, body))
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> LeaderboardResult<HttpResponse> {
        log::debug!("GET {}", url);
        into_http(self.agent.get(url).call())
    }

    fn post_json(&self, url: &str, body: &str) -> LeaderboardResult<HttpResponse> {
        log::debug!("POST {}", url);
        into_http(
            self.agent
                .post(url)
                .set("Content-Type", "application/json")
                .send_string(body),
        )
    }
}

// ==================== Backend Factory ====================

/// Create the leaderboard for a backend kind.
///
/// The remote backend needs an API URL; without one, or when it fails, the
/// local file takes over.
pub fn create_manager(
    kind: BackendKind,
    api_url: Option<&str>,
    data_dir: &Path,
) -> LeaderboardManager {
    let local = || {
        let store = FileStore::in_dir(data_dir);
        log::debug!("local scores at {}", store.path().display());
        Box::new(LocalLeaderboard::new(store))
    };
    match kind {
        BackendKind::Local => LeaderboardManager::new(local()),
        BackendKind::Test => LeaderboardManager::new(Box::new(MockLeaderboard::new(
            MemoryStore::new(),
        ))),
        BackendKind::Remote => {
            let url = api_url.unwrap_or_default();
            if url.is_empty() {
                log::warn!("remote leaderboard selected without an API URL");
            }
            let remote = RemoteLeaderboard::new(url, UreqTransport::default());
            LeaderboardManager::new(Box::new(remote)).with_fallback(local())
        }
    }
}

// ==================== Background Worker ====================

/// Work handed to the leaderboard thread
#[derive(Debug)]
pub enum Request {
    List,
    Submit(ScoreRecord),
}

/// Answer to a [`Request`], in request order
#[derive(Debug)]
pub enum Reply {
    Listed(LeaderboardResult<LeaderboardView>),
    Submitted(LeaderboardResult<LeaderboardView>),
}

impl Request {
    fn handle(self, manager: &LeaderboardManager) -> Reply {
        match self {
            Request::List => Reply::Listed(manager.list()),
            Request::Submit(record) => Reply::Submitted(manager.submit(record)),
        }
    }
}

/// Owns the manager on a background thread; replies are polled
pub struct LeaderboardWorker {
    requests: mpsc::Sender<Request>,
    replies: mpsc::Receiver<Reply>,
    status: LeaderboardStatus,
    in_flight: usize,
}

impl LeaderboardWorker {
    pub fn spawn(manager: LeaderboardManager) -> Self {
        let status = manager.status();
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel();
        std::thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                if reply_tx.send(request.handle(&manager)).is_err() {
                    break;
                }
            }
            log::debug!("leaderboard worker stopped");
        });
        Self {
            requests: request_tx,
            replies: reply_rx,
            status,
            in_flight: 0,
        }
    }

    /// Queue a request; the reply arrives through [`LeaderboardWorker::poll`]
    pub fn send(&mut self, request: Request) -> LeaderboardResult<()> {
        self.requests
            .send(request)
            .map_err(|_| LeaderboardError::StorageError("leaderboard worker stopped".into()))?;
        self.in_flight += 1;
        Ok(())
    }

    /// Next finished reply, if any
    pub fn poll(&mut self) -> Option<Reply> {
        match self.replies.try_recv() {
            Ok(reply) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(reply)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.in_flight = 0;
                None
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Backend status captured when the worker started
    pub fn status(&self) -> &LeaderboardStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsaw_core::LeaderboardBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_dir() -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        std::env::temp_dir().join(format!(
            "jigsaw-tui-test-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ))
    }

    fn record(nickname: &str, score: u32, timestamp: u64) -> ScoreRecord {
        ScoreRecord {
            nickname: nickname.to_string(),
            score,
            difficulty: "4x4".to_string(),
            time: "01:00".to_string(),
            date: "2026-10-19".to_string(),
            emotion: "👍 Good".to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name(None), Environment::Local);
        assert_eq!(Environment::from_name(Some("prod")), Environment::Production);
        assert_eq!(Environment::from_name(Some("testing")), Environment::Test);
        assert_eq!(Environment::from_name(Some("staging")), Environment::Local);
        assert_eq!(Environment::Production.backend_kind(), BackendKind::Remote);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = temp_dir();
        let board = LocalLeaderboard::new(FileStore::in_dir(&dir));
        assert!(board.fetch().unwrap().is_empty());

        board.submit(record("ana", 40, 1)).unwrap();
        board.submit(record("bo", 90, 2)).unwrap();

        // A fresh store reads what the first one wrote
        let reopened = LocalLeaderboard::new(FileStore::in_dir(&dir));
        let ranked = reopened.fetch().unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].nickname, "bo");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_tolerates_garbage() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::in_dir(&dir);
        std::fs::write(store.path(), "not json").unwrap();
        assert!(store.load().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_test_backend_is_in_memory() {
        let manager = create_manager(BackendKind::Test, None, &temp_dir());
        assert_eq!(manager.status().backend_name, "Memory");
        let view = manager.submit(record("cy", 70, 3)).unwrap();
        assert_eq!(view.entries()[0].rank, 1);
    }

    #[test]
    fn test_remote_without_url_uses_local_file() {
        let dir = temp_dir();
        let manager = create_manager(BackendKind::Remote, None, &dir);
        let status = manager.status();
        assert!(status.using_fallback);
        assert_eq!(status.backend_name, "Local");

        // Submitting to an empty URL fails fast and lands in the file
        let view = manager.submit(record("dee", 55, 4)).unwrap();
        assert_eq!(view.entries().len(), 1);
        assert!(dir.join(LEADERBOARD_FILE).exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
