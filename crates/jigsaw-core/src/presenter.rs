//! Capability interface the session drives its front end through
//!
//! The session never touches a DOM or a terminal directly. Front ends
//! implement [`Presenter`] and the session calls into it after every state
//! change; [`RecordingPresenter`] captures those calls for tests and
//! headless runs.

use crate::board::{BoardGeometry, BoardLayout, Rect};
use crate::hint::Hint;
use crate::input::{HitTest, PointerId};
use crate::leaderboard::LeaderboardView;
use crate::permutation::CellIndex;
use crate::scoring::Victory;
use crate::session::Screen;

/// Dialogs layered over the game screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    Difficulty,
    Victory,
    GameOver,
    Leaderboard,
}

impl Modal {
    pub const ALL: [Modal; 4] = [
        Modal::Difficulty,
        Modal::Victory,
        Modal::GameOver,
        Modal::Leaderboard,
    ];
}

/// Named audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Looping background music
    Background,
    /// Victory fanfare
    Fanfare,
    /// Short cue on every swap
    Swap,
}

/// Everything the session asks of a front end
pub trait Presenter: HitTest {
    /// Board rectangle in the same coordinates as pointer events
    fn board_geometry(&self) -> BoardGeometry;

    fn show_screen(&mut self, screen: Screen);

    /// Create tiles for a new puzzle
    fn build_board(&mut self, image: &str, grid_size: usize);

    /// Place every tile; must be safe to call repeatedly
    fn render(&mut self, layout: &BoardLayout);

    fn show_modal(&mut self, modal: Modal);
    fn hide_modal(&mut self, modal: Modal);

    fn set_timer_text(&mut self, text: &str);
    fn set_moves_text(&mut self, text: &str);
    fn set_difficulty_label(&mut self, text: &str);

    /// Mark a tile as lifted and start routing `pointer` to the board
    fn lift_tile(&mut self, pointer: PointerId, cell: CellIndex);

    /// Draw a lifted tile at a board-relative offset
    fn move_lifted_tile(&mut self, cell: CellIndex, dx: f64, dy: f64);

    /// Toggle the drop-target highlight of a tile
    fn set_hover(&mut self, cell: CellIndex, highlighted: bool);

    /// Undo [`Presenter::lift_tile`]; called once per lift
    fn release_tile(&mut self, pointer: PointerId, cell: CellIndex);

    fn show_hint(&mut self, hint: &Hint);
    fn clear_hint(&mut self);

    fn show_victory(&mut self, victory: &Victory);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn show_leaderboard(&mut self, view: &LeaderboardView);

    fn play_cue(&mut self, cue: Cue);
    fn pause_cue(&mut self, cue: Cue);

    /// Non-fatal message for the player
    fn notify(&mut self, message: &str);
}

/// One captured presenter call
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    ShowScreen(Screen),
    BuildBoard { image: String, grid_size: usize },
    Render(BoardLayout),
    ShowModal(Modal),
    HideModal(Modal),
    TimerText(String),
    MovesText(String),
    DifficultyLabel(String),
    LiftTile(PointerId, CellIndex),
    MoveLiftedTile(CellIndex, f64, f64),
    SetHover(CellIndex, bool),
    ReleaseTile(PointerId, CellIndex),
    ShowHint(Hint),
    ClearHint,
    ShowVictory(Victory),
    SubmitEnabled(bool),
    ShowLeaderboard(LeaderboardView),
    PlayCue(Cue),
    PauseCue(Cue),
    Notify(String),
}

/// Presenter that records calls and hit-tests with grid math
#[derive(Debug, Clone)]
pub struct RecordingPresenter {
    pub geometry: BoardGeometry,
    pub calls: Vec<PresenterCall>,
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 400.0, 400.0))
    }
}

impl RecordingPresenter {
    pub fn new(board_rect: Rect) -> Self {
        Self {
            geometry: BoardGeometry::new(board_rect, 1),
            calls: Vec::new(),
        }
    }

    /// Remove and return everything recorded so far
    pub fn take(&mut self) -> Vec<PresenterCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn contains(&self, call: &PresenterCall) -> bool {
        self.calls.contains(call)
    }

    pub fn count(&self, pred: impl Fn(&PresenterCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Most recent layout passed to `render`
    pub fn last_layout(&self) -> Option<&BoardLayout> {
        self.calls.iter().rev().find_map(|c| match c {
            PresenterCall::Render(layout) => Some(layout),
            _ => None,
        })
    }

    pub fn last_timer_text(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            PresenterCall::TimerText(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.calls.iter().rev().find_map(|c| match c {
            PresenterCall::ShowScreen(screen) => Some(*screen),
            _ => None,
        })
    }
}

impl HitTest for RecordingPresenter {
    fn tile_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        self.geometry.cell_at(x, y)
    }
}

impl Presenter for RecordingPresenter {
    fn board_geometry(&self) -> BoardGeometry {
        self.geometry
    }

    fn show_screen(&mut self, screen: Screen) {
        self.calls.push(PresenterCall::ShowScreen(screen));
    }

    fn build_board(&mut self, image: &str, grid_size: usize) {
        self.geometry.grid_size = grid_size;
        self.calls.push(PresenterCall::BuildBoard {
            image: image.to_string(),
            grid_size,
        });
    }

    fn render(&mut self, layout: &BoardLayout) {
        self.calls.push(PresenterCall::Render(layout.clone()));
    }

    fn show_modal(&mut self, modal: Modal) {
        self.calls.push(PresenterCall::ShowModal(modal));
    }

    fn hide_modal(&mut self, modal: Modal) {
        self.calls.push(PresenterCall::HideModal(modal));
    }

    fn set_timer_text(&mut self, text: &str) {
        self.calls.push(PresenterCall::TimerText(text.to_string()));
    }

    fn set_moves_text(&mut self, text: &str) {
        self.calls.push(PresenterCall::MovesText(text.to_string()));
    }

    fn set_difficulty_label(&mut self, text: &str) {
        self.calls.push(PresenterCall::DifficultyLabel(text.to_string()));
    }

    fn lift_tile(&mut self, pointer: PointerId, cell: CellIndex) {
        self.calls.push(PresenterCall::LiftTile(pointer, cell));
    }

    fn move_lifted_tile(&mut self, cell: CellIndex, dx: f64, dy: f64) {
        self.calls.push(PresenterCall::MoveLiftedTile(cell, dx, dy));
    }

    fn set_hover(&mut self, cell: CellIndex, highlighted: bool) {
        self.calls.push(PresenterCall::SetHover(cell, highlighted));
    }

    fn release_tile(&mut self, pointer: PointerId, cell: CellIndex) {
        self.calls.push(PresenterCall::ReleaseTile(pointer, cell));
    }

    fn show_hint(&mut self, hint: &Hint) {
        self.calls.push(PresenterCall::ShowHint(*hint));
    }

    fn clear_hint(&mut self) {
        self.calls.push(PresenterCall::ClearHint);
    }

    fn show_victory(&mut self, victory: &Victory) {
        self.calls.push(PresenterCall::ShowVictory(victory.clone()));
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.calls.push(PresenterCall::SubmitEnabled(enabled));
    }

    fn show_leaderboard(&mut self, view: &LeaderboardView) {
        self.calls.push(PresenterCall::ShowLeaderboard(view.clone()));
    }

    fn play_cue(&mut self, cue: Cue) {
        self.calls.push(PresenterCall::PlayCue(cue));
    }

    fn pause_cue(&mut self, cue: Cue) {
        self.calls.push(PresenterCall::PauseCue(cue));
    }

    fn notify(&mut self, message: &str) {
        self.calls.push(PresenterCall::Notify(message.to_string()));
    }
}
