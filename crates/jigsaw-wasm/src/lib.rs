//! WebAssembly build of the tile-swap jigsaw puzzle
//!
//! The page markup (gallery, board, modals, audio elements) stays in HTML.
//! A thin JS glue layer forwards DOM events into [`JigsawGame`] and calls
//! [`JigsawGame::tick`] from `requestAnimationFrame`:
//!
//! ```javascript
//! const game = new JigsawGame("puzzle-board");
//! board.addEventListener("pointerdown", (e) => game.pointer_down(e));
//! board.addEventListener("pointermove", (e) => game.pointer_move(e));
//! board.addEventListener("pointerup", (e) => game.pointer_up(e));
//! board.addEventListener("pointercancel", (e) => game.pointer_cancel(e));
//! (function frame() { game.tick(); requestAnimationFrame(frame); })();
//! ```
//!
//! A lifted tile holds pointer capture for its pointer until release, so
//! board listeners see the whole gesture even outside the board.

use jigsaw_core::leaderboard::LocalLeaderboard;
use jigsaw_core::{
    DifficultyTable, Event, ImageCatalog, LeaderboardBackend, LeaderboardView, PointerEvent,
    PointerEventKind, PointerId, Session, SessionConfig,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

mod dom;
mod http;
mod logger;
mod storage;

// WASM tests require wasm-pack test to run
#[cfg(all(test, target_arch = "wasm32"))]
mod tests;

pub use dom::DomPresenter;
pub use storage::LocalStorageStore;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Warn);
}

/// Change the console log level (`error`, `warn`, `info`, `debug`, `trace`)
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}

/// Monotonic clock for timers
fn now_ms() -> u64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() as u64)
        .unwrap_or(0)
}

/// Wall clock for record timestamps
fn wall_clock_ms() -> u64 {
    js_sys::Date::now() as u64
}

struct Controller {
    session: Session,
    presenter: DomPresenter,
    catalog: ImageCatalog,
    api_url: Option<String>,
    local: LocalLeaderboard<LocalStorageStore>,
}

impl Controller {
    fn dispatch(&mut self, event: Event) {
        self.session.dispatch(now_ms(), event, &mut self.presenter);
    }

    fn pointer(&mut self, kind: PointerEventKind, event: &web_sys::PointerEvent) {
        let pointer = PointerEvent::new(
            kind,
            PointerId(event.pointer_id()),
            event.client_x() as f64,
            event.client_y() as f64,
        );
        self.dispatch(Event::Pointer(pointer));
    }
}

/// The main WASM game controller
#[wasm_bindgen]
pub struct JigsawGame {
    inner: Rc<RefCell<Controller>>,
}

#[wasm_bindgen]
impl JigsawGame {
    /// Create a game attached to the board element
    #[wasm_bindgen(constructor)]
    pub fn new(board_id: &str) -> Result<JigsawGame, JsValue> {
        let document = web_sys::window()
            .ok_or("No window")?
            .document()
            .ok_or("No document")?;
        let presenter = DomPresenter::new(document, board_id)?;

        let controller = Controller {
            session: Session::new(SessionConfig::default(), now_ms()),
            presenter,
            catalog: ImageCatalog::default(),
            api_url: None,
            local: LocalLeaderboard::new(LocalStorageStore::default()),
        };
        Ok(JigsawGame {
            inner: Rc::new(RefCell::new(controller)),
        })
    }

    /// Fire due timers (call from requestAnimationFrame)
    #[wasm_bindgen]
    pub fn tick(&self) {
        let mut c = self.inner.borrow_mut();
        let Controller {
            session, presenter, ..
        } = &mut *c;
        session.advance(now_ms(), presenter);
    }

    /// Image URLs for the gallery, in display order
    #[wasm_bindgen]
    pub fn gallery(&self) -> Result<JsValue, JsValue> {
        let urls = self.inner.borrow().catalog.urls();
        Ok(serde_wasm_bindgen::to_value(&urls)?)
    }

    /// Replace the image manifest
    #[wasm_bindgen]
    pub fn set_gallery(&self, base_path: &str, files: Vec<String>) {
        self.inner.borrow_mut().catalog = ImageCatalog::new(base_path, files);
    }

    /// Use a remote leaderboard service; `None` keeps scores in localStorage
    #[wasm_bindgen]
    pub fn set_api_url(&self, url: Option<String>) {
        let url = url.filter(|u| !u.trim().is_empty());
        log::info!("leaderboard backend: {}", url.as_deref().unwrap_or("localStorage"));
        self.inner.borrow_mut().api_url = url;
    }

    /// Load a difficulty table from JSON (grid size → tier)
    #[wasm_bindgen]
    pub fn set_difficulty_table(&self, json: &str) -> Result<(), JsValue> {
        let table = DifficultyTable::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.borrow_mut().session.set_difficulties(table);
        Ok(())
    }

    /// Switch to the built-in 3x3 to 10x10 lineup
    #[wasm_bindgen]
    pub fn use_classic_difficulties(&self) {
        self.inner
            .borrow_mut()
            .session
            .set_difficulties(DifficultyTable::classic());
    }

    /// Configured grid sizes, smallest first
    #[wasm_bindgen]
    pub fn grid_sizes(&self) -> Vec<u32> {
        self.inner
            .borrow()
            .session
            .config()
            .difficulties
            .grid_sizes()
            .into_iter()
            .map(|n| n as u32)
            .collect()
    }

    #[wasm_bindgen]
    pub fn user_gesture(&self) {
        self.inner.borrow_mut().dispatch(Event::UserGesture);
    }

    #[wasm_bindgen]
    pub fn select_image(&self, url: &str) {
        self.inner
            .borrow_mut()
            .dispatch(Event::SelectImage(url.to_string()));
    }

    #[wasm_bindgen]
    pub fn open_difficulty_dialog(&self) {
        self.inner.borrow_mut().dispatch(Event::OpenDifficultyDialog);
    }

    #[wasm_bindgen]
    pub fn close_difficulty_dialog(&self) {
        self.inner.borrow_mut().dispatch(Event::CloseDifficultyDialog);
    }

    #[wasm_bindgen]
    pub fn choose_difficulty(&self, grid_size: u32) {
        self.inner
            .borrow_mut()
            .dispatch(Event::ChooseDifficulty(grid_size as usize));
    }

    #[wasm_bindgen]
    pub fn pointer_down(&self, event: &web_sys::PointerEvent) {
        self.inner
            .borrow_mut()
            .pointer(PointerEventKind::Down, event);
    }

    #[wasm_bindgen]
    pub fn pointer_move(&self, event: &web_sys::PointerEvent) {
        let mut c = self.inner.borrow_mut();
        if c.session.active_drags() > 0 {
            event.prevent_default();
        }
        c.pointer(PointerEventKind::Move, event);
    }

    #[wasm_bindgen]
    pub fn pointer_up(&self, event: &web_sys::PointerEvent) {
        self.inner.borrow_mut().pointer(PointerEventKind::Up, event);
    }

    #[wasm_bindgen]
    pub fn pointer_cancel(&self, event: &web_sys::PointerEvent) {
        self.inner
            .borrow_mut()
            .pointer(PointerEventKind::Cancel, event);
    }

    #[wasm_bindgen]
    pub fn request_hint(&self) {
        self.inner.borrow_mut().dispatch(Event::RequestHint);
    }

    #[wasm_bindgen]
    pub fn shuffle(&self) {
        self.inner.borrow_mut().dispatch(Event::Shuffle);
    }

    #[wasm_bindgen]
    pub fn restart(&self) {
        self.inner.borrow_mut().dispatch(Event::Restart);
    }

    #[wasm_bindgen]
    pub fn return_to_gallery(&self) {
        self.inner.borrow_mut().dispatch(Event::ReturnToGallery);
    }

    /// Toggle sound; returns whether sound is now on
    #[wasm_bindgen]
    pub fn toggle_sound(&self) -> bool {
        let mut c = self.inner.borrow_mut();
        c.dispatch(Event::ToggleSound);
        c.session.sound_on()
    }

    #[wasm_bindgen]
    pub fn close_leaderboard(&self) {
        self.inner.borrow_mut().dispatch(Event::CloseLeaderboard);
    }

    /// Submit the last win; resolves to `true` once stored
    #[wasm_bindgen]
    pub fn submit_score(&self, nickname: &str) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        let record = {
            let mut c = inner.borrow_mut();
            let Controller {
                session, presenter, ..
            } = &mut *c;
            session.begin_submission(nickname, wall_clock_ms(), presenter)
        };

        future_to_promise(async move {
            let record = record.map_err(|e| JsValue::from_str(&e.to_string()))?;
            let api_url = inner.borrow().api_url.clone();
            let result = match api_url {
                Some(url) => http::submit_score(&url, &record).await,
                None => inner.borrow().local.submit(record),
            }
            .map(LeaderboardView::from_ranked);
            let stored = result.is_ok();

            let mut c = inner.borrow_mut();
            let Controller {
                session, presenter, ..
            } = &mut *c;
            session.finish_submission(result, presenter);
            Ok(JsValue::from_bool(stored))
        })
    }

    /// Fetch and show the leaderboard
    #[wasm_bindgen]
    pub fn show_leaderboard(&self) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let api_url = inner.borrow().api_url.clone();
            let result = match api_url {
                Some(url) => http::fetch_scores(&url).await,
                None => inner.borrow().local.fetch(),
            }
            .map(LeaderboardView::from_ranked);
            let view = result
                .as_ref()
                .ok()
                .map(serde_wasm_bindgen::to_value)
                .transpose()?
                .unwrap_or(JsValue::NULL);

            let mut c = inner.borrow_mut();
            let Controller {
                session, presenter, ..
            } = &mut *c;
            session.show_leaderboard(result, presenter);
            Ok(view)
        })
    }

    /// Current screen name
    #[wasm_bindgen]
    pub fn screen(&self) -> String {
        format!("{:?}", self.inner.borrow().session.screen())
    }

    #[wasm_bindgen]
    pub fn moves(&self) -> u32 {
        self.inner
            .borrow()
            .session
            .game()
            .map(|g| g.moves)
            .unwrap_or(0)
    }

    /// Whether the last win can be submitted right now
    #[wasm_bindgen]
    pub fn can_submit(&self) -> bool {
        self.inner.borrow().session.submit_state() == jigsaw_core::SubmitState::Ready
    }

    /// Get the current board layout as JSON
    #[wasm_bindgen]
    pub fn get_layout_json(&self) -> String {
        self.inner
            .borrow()
            .session
            .game()
            .map(|g| jigsaw_core::layout(&g.permutation))
            .and_then(|layout| serde_json::to_string(&layout).ok())
            .unwrap_or_default()
    }
}
