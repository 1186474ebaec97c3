use crate::config::{resolve_image, Config};
use crate::leaderboard::{create_manager, LeaderboardWorker, Reply, Request};
use crate::presenter::{cell_point, TerminalPresenter};
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use jigsaw_core::{
    CellIndex, Event, ImageCatalog, LeaderboardManager, Modal, PointerEvent, PointerId, Position,
    Screen, Session, Shuffler, SubmitState,
};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Pointer id of the mouse
pub const MOUSE: PointerId = PointerId(0);
/// Pointer id of the keyboard cursor
pub const KEYBOARD: PointerId = PointerId(1);
/// Longest nickname the entry field accepts
pub const MAX_NICKNAME_LEN: usize = 20;

/// Result of handling a key press
pub enum AppAction {
    Continue,
    Quit,
}

/// The main application state
pub struct App {
    pub session: Session,
    /// What the session last reported
    pub view: TerminalPresenter,
    pub catalog: ImageCatalog,
    /// Store calls run off the input loop
    pub leaderboard: LeaderboardWorker,
    /// Color theme
    pub theme: Theme,
    /// Highlighted gallery entry
    pub gallery_selection: usize,
    /// Highlighted grid size in the difficulty dialog
    pub difficulty_selection: usize,
    /// Keyboard cursor on the board
    pub cursor: CellIndex,
    /// Nickname being typed after a win
    pub nickname: String,
    /// Whether keys go to the nickname field
    pub entering_name: bool,
    started: Instant,
}

impl App {
    pub fn new(config: Config, catalog: ImageCatalog) -> Self {
        let leaderboard =
            create_manager(config.backend, config.api_url.as_deref(), &config.data_dir);
        Self::with_leaderboard(config, catalog, leaderboard)
    }

    pub fn with_leaderboard(
        config: Config,
        catalog: ImageCatalog,
        leaderboard: LeaderboardManager,
    ) -> Self {
        let shuffler = match config.seed {
            Some(seed) => Shuffler::with_seed(seed),
            None => Shuffler::new(),
        };
        log::info!("leaderboard: {:?}", leaderboard.status());

        let started = Instant::now();
        let mut app = Self {
            session: Session::new(config.session, 0).with_shuffler(shuffler),
            view: TerminalPresenter::default(),
            catalog,
            leaderboard: LeaderboardWorker::spawn(leaderboard),
            theme: if config.high_contrast {
                Theme::high_contrast()
            } else {
                Theme::dark()
            },
            gallery_selection: 0,
            difficulty_selection: 0,
            cursor: 0,
            nickname: String::new(),
            entering_name: false,
            started,
        };

        // Terminals have no autoplay policy
        app.dispatch(Event::UserGesture);

        if let Some(start) = config.start {
            if let Some(i) = app.catalog.index_of(&start.image) {
                app.gallery_selection = i;
            }
            app.dispatch(Event::SelectImage(start.image));
            if let Some(grid_size) = start.grid_size {
                app.dispatch(Event::ChooseDifficulty(grid_size));
            }
        }
        app
    }

    /// Milliseconds since start, the session clock
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn dispatch(&mut self, event: Event) {
        let now = self.now_ms();
        self.session.dispatch(now, event, &mut self.view);
        self.clamp_cursor();
    }

    /// Get the tick rate
    pub fn get_tick_rate(&self) -> Duration {
        Duration::from_millis(50)
    }

    /// Fire due timers, apply store replies and age notices (called every tick)
    pub fn tick(&mut self) {
        let now = self.now_ms();
        self.session.advance(now, &mut self.view);
        while let Some(reply) = self.leaderboard.poll() {
            self.apply_reply(reply);
        }
        self.view.tick_message();
        if self.session.screen() != Screen::Won {
            self.entering_name = false;
        }
    }

    pub fn grid_size(&self) -> usize {
        self.session.game().map(|g| g.grid_size).unwrap_or(0)
    }

    fn clamp_cursor(&mut self) {
        let n = self.grid_size();
        if n == 0 || self.cursor >= n * n {
            self.cursor = 0;
        }
    }

    /// Grid sizes offered in the difficulty dialog
    pub fn difficulty_options(&self) -> Vec<usize> {
        self.session.config().difficulties.grid_sizes()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if self.view.is_modal_open(Modal::Leaderboard) {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('b')
            ) {
                self.dispatch(Event::CloseLeaderboard);
            }
            return AppAction::Continue;
        }
        if self.entering_name {
            self.handle_name_key(key);
            return AppAction::Continue;
        }

        match self.session.screen() {
            Screen::Gallery => self.handle_gallery_key(key),
            Screen::DifficultySelect | Screen::Paused => self.handle_difficulty_key(key),
            Screen::Active => self.handle_game_key(key),
            Screen::Won | Screen::Lost => self.handle_endgame_key(key),
        }
    }

    /// Keys that work everywhere outside text entry
    fn handle_common_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('m') => self.dispatch(Event::ToggleSound),
            KeyCode::Char('b') => self.show_leaderboard(),
            KeyCode::Char('t') => self.toggle_theme(),
            _ => return None,
        }
        Some(AppAction::Continue)
    }

    fn handle_gallery_key(&mut self, key: KeyEvent) -> AppAction {
        let count = self.catalog.len().max(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.gallery_selection = (self.gallery_selection + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.gallery_selection = (self.gallery_selection + 1) % count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(url) = self.catalog.url(self.gallery_selection) {
                    self.open_image(url);
                }
            }
            KeyCode::Char('r') => {
                if let Some(url) = resolve_image("random", &self.catalog) {
                    if let Some(i) = self.catalog.index_of(&url) {
                        self.gallery_selection = i;
                    }
                    self.open_image(url);
                }
            }
            KeyCode::Esc => return AppAction::Quit,
            _ => return self.handle_common_key(key).unwrap_or(AppAction::Continue),
        }
        AppAction::Continue
    }

    fn open_image(&mut self, url: String) {
        self.difficulty_selection = 0;
        self.dispatch(Event::SelectImage(url));
    }

    fn handle_difficulty_key(&mut self, key: KeyEvent) -> AppAction {
        let options = self.difficulty_options();
        let count = options.len().max(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.difficulty_selection = (self.difficulty_selection + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.difficulty_selection = (self.difficulty_selection + 1) % count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(&grid_size) = options.get(self.difficulty_selection) {
                    self.dispatch(Event::ChooseDifficulty(grid_size));
                }
            }
            // Any other size plays untimed
            KeyCode::Char(c @ '1'..='9') => {
                let grid_size = c.to_digit(10).unwrap_or(0) as usize;
                self.dispatch(Event::ChooseDifficulty(grid_size));
            }
            KeyCode::Esc => self.dispatch(Event::CloseDifficultyDialog),
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_game_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_keyboard_drag(),
            KeyCode::Esc => {
                if self.view.lifted_cell(KEYBOARD).is_some() {
                    self.dispatch(Event::Pointer(PointerEvent::cancel(KEYBOARD)));
                }
            }
            KeyCode::Char('?') => self.dispatch(Event::RequestHint),
            KeyCode::Char('s') => self.dispatch(Event::Shuffle),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.dispatch(Event::Restart)
            }
            KeyCode::Char('d') => {
                self.difficulty_selection = self.current_difficulty_index();
                self.dispatch(Event::OpenDifficultyDialog);
            }
            KeyCode::Char('g') => self.dispatch(Event::ReturnToGallery),
            _ => return self.handle_common_key(key).unwrap_or(AppAction::Continue),
        }
        AppAction::Continue
    }

    fn handle_endgame_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Enter | KeyCode::Char('n') if self.can_submit() => {
                self.entering_name = true;
            }
            KeyCode::Char('d') => {
                self.difficulty_selection = self.current_difficulty_index();
                self.dispatch(Event::OpenDifficultyDialog);
            }
            KeyCode::Char('r') => self.dispatch(Event::Restart),
            KeyCode::Char('g') | KeyCode::Esc => self.dispatch(Event::ReturnToGallery),
            _ => return self.handle_common_key(key).unwrap_or(AppAction::Continue),
        }
        AppAction::Continue
    }

    fn handle_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if !c.is_control() => {
                if self.nickname.chars().count() < MAX_NICKNAME_LEN {
                    self.nickname.push(c);
                }
            }
            KeyCode::Backspace => {
                self.nickname.pop();
            }
            KeyCode::Enter => self.submit_score(),
            KeyCode::Esc => self.entering_name = false,
            _ => {}
        }
    }

    pub fn can_submit(&self) -> bool {
        self.session.submit_state() == SubmitState::Ready
    }

    fn submit_score(&mut self) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let nickname = self.nickname.clone();
        let record = match self
            .session
            .begin_submission(&nickname, timestamp, &mut self.view)
        {
            Ok(record) => record,
            Err(e) => {
                log::debug!("submission not started: {}", e);
                // A bad name keeps the field open
                self.entering_name = self.can_submit();
                return;
            }
        };
        self.entering_name = false;
        if let Err(e) = self.leaderboard.send(Request::Submit(record)) {
            self.apply_reply(Reply::Submitted(Err(e)));
        }
    }

    fn show_leaderboard(&mut self) {
        if self.leaderboard.is_busy() {
            return;
        }
        if let Err(e) = self.leaderboard.send(Request::List) {
            self.apply_reply(Reply::Listed(Err(e)));
        }
    }

    fn apply_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Listed(result) => self.session.show_leaderboard(result, &mut self.view),
            Reply::Submitted(result) => {
                let stored = result.is_ok();
                self.session.finish_submission(result, &mut self.view);
                if stored {
                    self.nickname.clear();
                } else {
                    // Failures keep the name for a retry
                    self.entering_name = self.session.screen() == Screen::Won && self.can_submit();
                }
            }
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = if matches!(self.theme.bg, crossterm::style::Color::Black) {
            Theme::dark()
        } else {
            Theme::high_contrast()
        };
    }

    fn current_difficulty_index(&self) -> usize {
        let n = self.grid_size();
        self.difficulty_options()
            .iter()
            .position(|&size| size == n)
            .unwrap_or(0)
    }

    // ==================== Board input ====================

    fn cursor_point(&self) -> (f64, f64) {
        self.view.geometry().cell_center(self.cursor)
    }

    fn move_cursor(&mut self, row_delta: i32, col_delta: i32) {
        let n = self.grid_size();
        if n == 0 {
            return;
        }
        let at = Position::from_index(self.cursor, n);
        let row = (at.row as i32 + row_delta).clamp(0, n as i32 - 1) as usize;
        let col = (at.col as i32 + col_delta).clamp(0, n as i32 - 1) as usize;
        self.cursor = Position::new(row, col).to_index(n);

        if self.view.lifted_cell(KEYBOARD).is_some() {
            let (x, y) = self.cursor_point();
            self.dispatch(Event::Pointer(PointerEvent::moved(KEYBOARD, x, y)));
        }
    }

    /// Space lifts the tile under the cursor, and drops it on a second press
    fn toggle_keyboard_drag(&mut self) {
        let (x, y) = self.cursor_point();
        let event = if self.view.lifted_cell(KEYBOARD).is_some() {
            PointerEvent::up(KEYBOARD, x, y)
        } else {
            PointerEvent::down(KEYBOARD, x, y)
        };
        self.dispatch(Event::Pointer(event));
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = cell_point(mouse.column, mouse.row);
        let event = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(cell) = self.view.geometry().cell_at(x, y) {
                    self.cursor = cell;
                }
                PointerEvent::down(MOUSE, x, y)
            }
            MouseEventKind::Drag(MouseButton::Left) => PointerEvent::moved(MOUSE, x, y),
            MouseEventKind::Up(MouseButton::Left) => PointerEvent::up(MOUSE, x, y),
            _ => return,
        };
        self.dispatch(Event::Pointer(event));
    }

    /// Keep the board fitted to the terminal
    pub fn resize(&mut self, width: u16, height: u16) {
        // Rects captured at lift time would be stale
        for pointer in [MOUSE, KEYBOARD] {
            if self.view.lifted_cell(pointer).is_some() {
                self.dispatch(Event::Pointer(PointerEvent::cancel(pointer)));
            }
        }
        self.view.set_viewport(width, height);
    }
}
