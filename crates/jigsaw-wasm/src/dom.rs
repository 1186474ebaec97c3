//! DOM presenter
//!
//! Tiles are absolutely positioned `div.puzzle-tile` children of the board,
//! one per piece, moved with CSS transforms. Everything else is looked up by
//! element id in the page markup.

use jigsaw_core::{
    layout, BoardGeometry, BoardLayout, CellIndex, Cue, Hint, HitTest, LeaderboardView, Modal,
    Permutation, PointerId, Presenter, Rect, Screen, Victory,
};
use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlMediaElement};

const TILE_CLASS: &str = "puzzle-tile";
const HIDDEN: &str = "hidden";
const MAX_BOARD_PX: f64 = 500.0;

fn modal_id(modal: Modal) -> &'static str {
    match modal {
        Modal::Difficulty => "difficulty-modal",
        Modal::Victory => "victory-modal",
        Modal::GameOver => "game-over-modal",
        Modal::Leaderboard => "leaderboard-modal",
    }
}

fn cue_id(cue: Cue) -> &'static str {
    match cue {
        Cue::Background => "bgm-audio",
        Cue::Fanfare => "fanfare-audio",
        Cue::Swap => "combo-audio",
    }
}

/// Minimal HTML escaping for user-provided text
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Leaderboard table markup
pub fn leaderboard_html(view: &LeaderboardView) -> String {
    if view.is_empty() {
        return "<p>No scores registered yet.</p>".to_string();
    }
    let rows: String = view
        .entries()
        .iter()
        .map(|entry| {
            let r = &entry.record;
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                entry.rank,
                escape_html(&r.nickname),
                r.score,
                escape_html(&r.emotion),
                escape_html(&r.difficulty),
                escape_html(&r.time),
                escape_html(&r.date)
            )
        })
        .collect();
    format!(
        "<table><thead><tr><th>Rank</th><th>Nickname</th><th>Score</th><th>Status</th>\
         <th>Difficulty</th><th>Time</th><th>Date</th></tr></thead><tbody>{}</tbody></table>",
        rows
    )
}

pub struct DomPresenter {
    document: Document,
    board: HtmlElement,
    /// Tile elements indexed by piece
    tiles: Vec<HtmlElement>,
    /// Piece in each cell as of the last render
    cells: Vec<usize>,
    grid_size: usize,
    lifted: HashMap<PointerId, HtmlElement>,
    hint_target: Option<Element>,
}

impl DomPresenter {
    pub fn new(document: Document, board_id: &str) -> Result<Self, JsValue> {
        let board = document
            .get_element_by_id(board_id)
            .ok_or("Board element not found")?
            .dyn_into::<HtmlElement>()?;
        Ok(Self {
            document,
            board,
            tiles: Vec::new(),
            cells: Vec::new(),
            grid_size: 0,
            lifted: HashMap::new(),
            hint_target: None,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn element(&self, id: &str) -> Option<HtmlElement> {
        let found = self
            .document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());
        if found.is_none() {
            log::debug!("element #{} not found", id);
        }
        found
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        if let Some(el) = self.element(id) {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1(HIDDEN)
            } else {
                classes.remove_1(HIDDEN)
            };
        }
    }

    fn tile_in_cell(&self, cell: CellIndex) -> Option<&HtmlElement> {
        self.cells.get(cell).and_then(|&piece| self.tiles.get(piece))
    }

    fn audio(&self, cue: Cue) -> Option<HtmlMediaElement> {
        self.element(cue_id(cue))
            .and_then(|e| e.dyn_into::<HtmlMediaElement>().ok())
    }

    fn board_px(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|w| w.as_f64())
            .map(|w| (w * 0.9).min(MAX_BOARD_PX))
            .unwrap_or(MAX_BOARD_PX)
    }

    fn create_tile(&self, image: &str, piece: usize, background: &str, board_px: f64) -> Result<HtmlElement, JsValue> {
        let tile = self.document.create_element("div")?.dyn_into::<HtmlElement>()?;
        tile.set_class_name(TILE_CLASS);
        tile.set_attribute("data-piece-index", &piece.to_string())?;
        tile.set_attribute("role", "button")?;
        let style = tile.style();
        style.set_property("background-image", &format!("url({})", image))?;
        style.set_property("background-position", background)?;
        style.set_property("background-size", &format!("{}px {}px", board_px, board_px))?;
        self.board.append_child(&tile)?;
        Ok(tile)
    }
}

impl HitTest for DomPresenter {
    fn tile_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        let hit = self.document.element_from_point(x as f32, y as f32)?;
        let tile = hit.closest(&format!(".{}", TILE_CLASS)).ok().flatten()?;
        tile.get_attribute("data-grid-index")?.parse().ok()
    }
}

impl Presenter for DomPresenter {
    fn board_geometry(&self) -> BoardGeometry {
        let r = self.board.get_bounding_client_rect();
        BoardGeometry::new(
            Rect::new(r.left(), r.top(), r.width(), r.height()),
            self.grid_size,
        )
    }

    fn show_screen(&mut self, screen: Screen) {
        let in_gallery = screen == Screen::Gallery;
        self.set_hidden("gallery-screen", !in_gallery);
        self.set_hidden("game-screen", in_gallery);
    }

    fn build_board(&mut self, image: &str, grid_size: usize) {
        self.board.set_inner_html("");
        self.tiles.clear();
        self.lifted.clear();
        self.hint_target = None;
        self.grid_size = grid_size;

        let board_px = self.board_px();
        let style = self.board.style();
        let _ = style.set_property("--board-size", &format!("{}px", board_px));
        let _ = style.set_property("--tile-size", &format!("{}px", board_px / grid_size as f64));

        // Crops depend only on the piece, so the solved layout has them all
        let home = layout(&Permutation::identity(grid_size));
        for tile in &home.tiles {
            match self.create_tile(image, tile.piece, &tile.background_position_css(), board_px) {
                Ok(el) => self.tiles.push(el),
                Err(e) => {
                    log::error!("failed to create tile {}: {:?}", tile.piece, e);
                    return;
                }
            }
        }
        self.cells = (0..self.tiles.len()).collect();
    }

    fn render(&mut self, layout: &BoardLayout) {
        self.cells = vec![0; layout.tiles.len()];
        for tile in &layout.tiles {
            if let Some(slot) = self.cells.get_mut(tile.cell) {
                *slot = tile.piece;
            }
            let Some(el) = self.tiles.get(tile.piece) else {
                continue;
            };
            let _ = el.style().set_property("transform", &tile.transform_css());
            let _ = el.set_attribute("data-grid-index", &tile.cell.to_string());
            let _ = el.set_attribute("aria-label", &tile.aria_label());
        }
    }

    fn show_modal(&mut self, modal: Modal) {
        self.set_hidden(modal_id(modal), false);
    }

    fn hide_modal(&mut self, modal: Modal) {
        self.set_hidden(modal_id(modal), true);
    }

    fn set_timer_text(&mut self, text: &str) {
        self.set_text("timer", text);
    }

    fn set_moves_text(&mut self, text: &str) {
        self.set_text("move-counter", text);
    }

    fn set_difficulty_label(&mut self, text: &str) {
        self.set_text("difficulty-label", text);
    }

    fn lift_tile(&mut self, pointer: PointerId, cell: CellIndex) {
        let Some(el) = self.tile_in_cell(cell).cloned() else {
            return;
        };
        if let Err(e) = el.set_pointer_capture(pointer.0) {
            log::debug!("pointer capture failed: {:?}", e);
        }
        let _ = el.class_list().add_1("dragging");
        let _ = el.style().set_property("pointer-events", "none");
        self.lifted.insert(pointer, el);
    }

    fn move_lifted_tile(&mut self, cell: CellIndex, dx: f64, dy: f64) {
        if let Some(el) = self.tile_in_cell(cell) {
            let _ = el
                .style()
                .set_property("transform", &format!("translate3d({}px, {}px, 0)", dx, dy));
        }
    }

    fn set_hover(&mut self, cell: CellIndex, highlighted: bool) {
        if let Some(el) = self.tile_in_cell(cell) {
            let classes = el.class_list();
            let _ = if highlighted {
                classes.add_1("drop-target")
            } else {
                classes.remove_1("drop-target")
            };
        }
    }

    fn release_tile(&mut self, pointer: PointerId, _cell: CellIndex) {
        let Some(el) = self.lifted.remove(&pointer) else {
            return;
        };
        if el.has_pointer_capture(pointer.0) {
            let _ = el.release_pointer_capture(pointer.0);
        }
        let _ = el.class_list().remove_1("dragging");
        let _ = el.style().remove_property("pointer-events");
    }

    fn show_hint(&mut self, hint: &Hint) {
        self.clear_hint();
        if let Some(el) = self.tile_in_cell(hint.source) {
            let _ = el.class_list().add_1("hint-source");
        }
        if self.grid_size == 0 {
            return;
        }

        let Ok(target) = self.document.create_element("div") else {
            return;
        };
        let n = self.grid_size;
        let pct = 100.0 / n as f64;
        let style = format!(
            "width: {pct}%; height: {pct}%; left: {}%; top: {}%;",
            (hint.destination % n) as f64 * pct,
            (hint.destination / n) as f64 * pct,
        );
        let _ = target.set_attribute("class", "hint-target-cell");
        let _ = target.set_attribute("style", &style);
        if self.board.append_child(&target).is_ok() {
            self.hint_target = Some(target);
        }
    }

    fn clear_hint(&mut self) {
        for tile in &self.tiles {
            let _ = tile.class_list().remove_1("hint-source");
        }
        if let Some(target) = self.hint_target.take() {
            target.remove();
        }
    }

    fn show_victory(&mut self, victory: &Victory) {
        self.set_text("victory-time", &victory.time_string());
        self.set_text("victory-moves", &victory.moves.to_string());
        self.set_text("victory-score", &victory.score.to_string());
        self.set_text("victory-emotion-icon", victory.status.label());
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if let Some(button) = self
            .element("register-score-btn")
            .and_then(|e| e.dyn_into::<HtmlButtonElement>().ok())
        {
            button.set_disabled(!enabled);
        }
    }

    fn show_leaderboard(&mut self, view: &LeaderboardView) {
        if let Some(container) = self.element("leaderboard-table-container") {
            container.set_inner_html(&leaderboard_html(view));
        }
    }

    fn play_cue(&mut self, cue: Cue) {
        let Some(audio) = self.audio(cue) else {
            return;
        };
        if cue != Cue::Background {
            audio.set_current_time(0.0);
        }
        if let Err(e) = audio.play() {
            log::warn!("{} playback failed: {:?}", cue_id(cue), e);
        }
    }

    fn pause_cue(&mut self, cue: Cue) {
        if let Some(audio) = self.audio(cue) {
            let _ = audio.pause();
        }
    }

    fn notify(&mut self, message: &str) {
        log::info!("notice: {}", message);
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
