//! Tile-swap jigsaw puzzle engine
//!
//! The board is a permutation of pieces over cells. Players drag one tile
//! onto another to swap them until every piece is home. This crate holds
//! everything that is not drawing: shuffling, drag resolution, layout math,
//! hints, the session state machine with its timers, scoring, and the
//! leaderboard retention and ranking policy.

mod board;
mod catalog;
mod difficulty;
mod hint;
mod input;
mod permutation;
mod presenter;
mod schedule;
mod scoring;
mod session;
mod shuffle;

pub mod leaderboard;
pub mod remote;
pub mod service;

pub use board::{layout, BoardGeometry, BoardLayout, Rect, TileLayout};
pub use catalog::{ImageCatalog, DEFAULT_BASE_PATH};
pub use difficulty::{
    difficulty_label, is_valid_grid_size, ConfigError, DifficultyTable, TierConfig, MAX_GRID_SIZE,
    MIN_GRID_SIZE,
};
pub use hint::{compute_hint, Hint, HINT_DURATION_MS};
pub use input::{
    DragResolver, DragSession, DropOutcome, HitTest, HoverChange, PointerEvent, PointerEventKind,
    PointerId,
};
pub use leaderboard::{
    LeaderboardBackend, LeaderboardError, LeaderboardManager, LeaderboardResult, LeaderboardStatus,
    LeaderboardView, RankedEntry, ScoreRecord, MAX_ENTRIES,
};
pub use permutation::{
    CellIndex, Permutation, PermutationError, PermutationResult, PieceId, Position,
};
pub use presenter::{Cue, Modal, Presenter, PresenterCall, RecordingPresenter};
pub use schedule::{Due, Scheduler, Timeout, TICK_MS};
pub use scoring::{format_time, score, time_taken, ScoreStatus, Victory};
pub use session::{Event, Game, Screen, Session, SessionConfig, SubmitState, LOSS_RETURN_MS};
pub use shuffle::Shuffler;
