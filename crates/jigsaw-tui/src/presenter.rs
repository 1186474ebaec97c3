//! Session output captured for the terminal renderer
//!
//! Terminal coordinates are character cells; pointer positions use the
//! centre of a cell (`column + 0.5`), so the core's grid math works
//! unchanged.

use jigsaw_core::{
    BoardGeometry, BoardLayout, CellIndex, Cue, Hint, HitTest, LeaderboardView, Modal, PointerId,
    Presenter, Rect, Screen, Victory,
};
use std::collections::{HashMap, HashSet};

/// Columns reserved right of the board for the info panel
pub const INFO_PANEL_WIDTH: u16 = 30;
/// First row of the board
pub const BOARD_TOP: u16 = 3;
/// First column of the board
pub const BOARD_LEFT: u16 = 2;
/// Rows kept free under the board for the key help
const FOOTER_ROWS: u16 = 6;
/// Ticks a notice stays on screen
const MESSAGE_TICKS: u32 = 60;

/// Terminal-cell position of a pointer
pub fn cell_point(column: u16, row: u16) -> (f64, f64) {
    (column as f64 + 0.5, row as f64 + 0.5)
}

/// Presenter that keeps the last reported state for redraws
#[derive(Debug, Clone)]
pub struct TerminalPresenter {
    viewport: (u16, u16),
    geometry: BoardGeometry,
    pub screen: Screen,
    pub image: String,
    pub layout: Option<BoardLayout>,
    modals: Vec<Modal>,
    pub timer_text: String,
    pub moves_text: String,
    pub difficulty_label: String,
    lifted: HashMap<PointerId, CellIndex>,
    /// Board-relative top-left of each lifted tile
    offsets: HashMap<CellIndex, (f64, f64)>,
    hovered: HashSet<CellIndex>,
    pub hint: Option<Hint>,
    pub victory: Option<Victory>,
    pub submit_enabled: bool,
    pub leaderboard: Option<LeaderboardView>,
    music: bool,
    bell: bool,
    message: Option<String>,
    message_timer: u32,
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl TerminalPresenter {
    pub fn new(width: u16, height: u16) -> Self {
        let mut presenter = Self {
            viewport: (width, height),
            geometry: BoardGeometry::new(Rect::default(), 0),
            screen: Screen::Gallery,
            image: String::new(),
            layout: None,
            modals: Vec::new(),
            timer_text: String::new(),
            moves_text: String::new(),
            difficulty_label: String::new(),
            lifted: HashMap::new(),
            offsets: HashMap::new(),
            hovered: HashSet::new(),
            hint: None,
            victory: None,
            submit_enabled: false,
            leaderboard: None,
            music: false,
            bell: false,
            message: None,
            message_timer: 0,
        };
        presenter.fit_board();
        presenter
    }

    /// Track the terminal size; the board is re-fitted
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
            self.fit_board();
        }
    }

    /// Tile width and height in terminal cells
    pub fn tile_size(&self) -> (u16, u16) {
        let n = self.geometry.grid_size.max(1) as u16;
        let (width, height) = self.viewport;
        let avail_w = width.saturating_sub(BOARD_LEFT + INFO_PANEL_WIDTH + 2);
        let avail_h = height.saturating_sub(BOARD_TOP + FOOTER_ROWS);
        ((avail_w / n).clamp(3, 8), (avail_h / n).clamp(1, 4))
    }

    fn fit_board(&mut self) {
        let n = self.geometry.grid_size;
        let (tile_w, tile_h) = self.tile_size();
        self.geometry = BoardGeometry::new(
            Rect::new(
                BOARD_LEFT as f64,
                BOARD_TOP as f64,
                (tile_w as usize * n) as f64,
                (tile_h as usize * n) as f64,
            ),
            n,
        );
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn is_modal_open(&self, modal: Modal) -> bool {
        self.modals.contains(&modal)
    }

    /// Most recently opened modal
    pub fn top_modal(&self) -> Option<Modal> {
        self.modals.last().copied()
    }

    pub fn lifted_cell(&self, pointer: PointerId) -> Option<CellIndex> {
        self.lifted.get(&pointer).copied()
    }

    pub fn is_lifted(&self, cell: CellIndex) -> bool {
        self.lifted.values().any(|&c| c == cell)
    }

    pub fn lifted_offset(&self, cell: CellIndex) -> Option<(f64, f64)> {
        self.offsets.get(&cell).copied()
    }

    pub fn is_hovered(&self, cell: CellIndex) -> bool {
        self.hovered.contains(&cell)
    }

    pub fn music_playing(&self) -> bool {
        self.music
    }

    /// Whether a bell is due; clears the request
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Age the current notice by one tick
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message = None;
            }
        }
    }
}

impl HitTest for TerminalPresenter {
    fn tile_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        self.geometry.cell_at(x, y)
    }
}

impl Presenter for TerminalPresenter {
    fn board_geometry(&self) -> BoardGeometry {
        self.geometry
    }

    fn show_screen(&mut self, screen: Screen) {
        self.screen = screen;
        if screen == Screen::Gallery {
            self.layout = None;
            self.victory = None;
        }
    }

    fn build_board(&mut self, image: &str, grid_size: usize) {
        self.image = image.to_string();
        self.layout = None;
        self.lifted.clear();
        self.offsets.clear();
        self.hovered.clear();
        self.hint = None;
        self.geometry.grid_size = grid_size;
        self.fit_board();
    }

    fn render(&mut self, layout: &BoardLayout) {
        self.layout = Some(layout.clone());
    }

    fn show_modal(&mut self, modal: Modal) {
        self.modals.retain(|&m| m != modal);
        self.modals.push(modal);
    }

    fn hide_modal(&mut self, modal: Modal) {
        self.modals.retain(|&m| m != modal);
    }

    fn set_timer_text(&mut self, text: &str) {
        self.timer_text = text.to_string();
    }

    fn set_moves_text(&mut self, text: &str) {
        self.moves_text = text.to_string();
    }

    fn set_difficulty_label(&mut self, text: &str) {
        self.difficulty_label = text.to_string();
    }

    fn lift_tile(&mut self, pointer: PointerId, cell: CellIndex) {
        self.lifted.insert(pointer, cell);
        let r = self.geometry.cell_rect(cell);
        self.offsets
            .insert(cell, (r.left - self.geometry.rect.left, r.top - self.geometry.rect.top));
    }

    fn move_lifted_tile(&mut self, cell: CellIndex, dx: f64, dy: f64) {
        self.offsets.insert(cell, (dx, dy));
    }

    fn set_hover(&mut self, cell: CellIndex, highlighted: bool) {
        if highlighted {
            self.hovered.insert(cell);
        } else {
            self.hovered.remove(&cell);
        }
    }

    fn release_tile(&mut self, pointer: PointerId, cell: CellIndex) {
        self.lifted.remove(&pointer);
        self.offsets.remove(&cell);
    }

    fn show_hint(&mut self, hint: &Hint) {
        self.hint = Some(*hint);
    }

    fn clear_hint(&mut self) {
        self.hint = None;
    }

    fn show_victory(&mut self, victory: &Victory) {
        self.victory = Some(victory.clone());
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn show_leaderboard(&mut self, view: &LeaderboardView) {
        self.leaderboard = Some(view.clone());
    }

    fn play_cue(&mut self, cue: Cue) {
        match cue {
            Cue::Background => self.music = true,
            Cue::Fanfare => self.bell = true,
            Cue::Swap => {}
        }
    }

    fn pause_cue(&mut self, cue: Cue) {
        if cue == Cue::Background {
            self.music = false;
        }
    }

    fn notify(&mut self, message: &str) {
        log::info!("notice: {}", message);
        self.message = Some(message.to_string());
        self.message_timer = MESSAGE_TICKS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_fits_viewport() {
        let mut p = TerminalPresenter::new(100, 40);
        p.build_board("a.png", 4);
        let (tw, th) = p.tile_size();
        assert_eq!((tw, th), (8, 4));
        assert_eq!(p.geometry().rect.width, 32.0);

        // Huge grids bottom out at the minimum tile size
        p.build_board("a.png", 12);
        assert_eq!(p.tile_size(), (5, 2));
    }

    #[test]
    fn test_hit_test_uses_character_cells() {
        let mut p = TerminalPresenter::new(100, 40);
        p.build_board("a.png", 4);
        let (x, y) = cell_point(BOARD_LEFT + 8, BOARD_TOP);
        assert_eq!(p.tile_at(x, y), Some(1));
        let (x, y) = cell_point(0, 0);
        assert_eq!(p.tile_at(x, y), None);
    }

    #[test]
    fn test_modals_stack() {
        let mut p = TerminalPresenter::default();
        p.show_modal(Modal::Victory);
        p.show_modal(Modal::Leaderboard);
        assert_eq!(p.top_modal(), Some(Modal::Leaderboard));
        p.hide_modal(Modal::Leaderboard);
        assert_eq!(p.top_modal(), Some(Modal::Victory));
    }

    #[test]
    fn test_lift_and_release() {
        let mut p = TerminalPresenter::new(100, 40);
        p.build_board("a.png", 2);
        p.lift_tile(PointerId(1), 3);
        assert!(p.is_lifted(3));
        assert_eq!(p.lifted_cell(PointerId(1)), Some(3));
        p.move_lifted_tile(3, 1.0, 2.0);
        assert_eq!(p.lifted_offset(3), Some((1.0, 2.0)));
        p.release_tile(PointerId(1), 3);
        assert!(!p.is_lifted(3));
        assert_eq!(p.lifted_offset(3), None);
    }

    #[test]
    fn test_notice_expires() {
        let mut p = TerminalPresenter::default();
        p.notify("hello");
        for _ in 0..MESSAGE_TICKS - 1 {
            p.tick_message();
        }
        assert_eq!(p.message(), Some("hello"));
        p.tick_message();
        assert_eq!(p.message(), None);
    }

    #[test]
    fn test_fanfare_rings_once() {
        let mut p = TerminalPresenter::default();
        p.play_cue(Cue::Fanfare);
        assert!(p.take_bell());
        assert!(!p.take_bell());
    }
}
