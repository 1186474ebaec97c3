//! Game session state machine
//!
//! A [`Session`] owns the current game, the drag sessions, the scheduler and
//! the submission gate. Front ends feed it [`Event`]s and the current time;
//! it mutates state and reports every visible change through a
//! [`Presenter`].
//!
//! ```text
//! Gallery ─select─▶ DifficultySelect ─choose─▶ Active ◀─resume─ Paused
//!    ▲                                          │  ▲ └─dialog─────▲
//!    └──────────── return / loss timeout ── Won | Lost ─restart─┘
//! ```

use crate::board;
use crate::difficulty::{
    difficulty_label, is_valid_grid_size, DifficultyTable, TierConfig, MAX_GRID_SIZE, MIN_GRID_SIZE,
};
use crate::hint::{compute_hint, Hint, HINT_DURATION_MS};
use crate::input::{DragResolver, DragSession, DropOutcome, PointerEvent, PointerEventKind};
use crate::leaderboard::{
    validate_nickname, LeaderboardError, LeaderboardManager, LeaderboardResult, LeaderboardView,
    ScoreRecord,
};
use crate::permutation::{CellIndex, Permutation};
use crate::presenter::{Cue, Modal, Presenter};
use crate::schedule::{Due, Scheduler, Timeout};
use crate::scoring::{format_time, time_taken, Victory};
use crate::shuffle::Shuffler;

/// Delay before the game-over screen returns to the gallery
pub const LOSS_RETURN_MS: u64 = 3000;

/// Which screen the session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// No puzzle; choosing an image
    Gallery,
    /// Image chosen, waiting for a grid size
    DifficultySelect,
    /// Timer running, input enabled
    Active,
    /// Difficulty dialog reopened over a running game
    Paused,
    Won,
    Lost,
}

/// Everything that can happen to a session
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Any user interaction; the first one unlocks audio
    UserGesture,
    SelectImage(String),
    OpenDifficultyDialog,
    CloseDifficultyDialog,
    ChooseDifficulty(usize),
    Pointer(PointerEvent),
    RequestHint,
    /// Reshuffle the current board without resetting stats
    Shuffle,
    /// New shuffle of the same image and size with fresh stats
    Restart,
    ReturnToGallery,
    ToggleSound,
    CloseLeaderboard,
    Tick,
    Timeout(Timeout),
}

impl Event {
    /// Events that only a person can cause
    pub fn is_gesture(&self) -> bool {
        match self {
            Event::Pointer(p) => p.kind == PointerEventKind::Down,
            Event::Tick | Event::Timeout(_) => false,
            _ => true,
        }
    }
}

/// Session tunables
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub difficulties: DifficultyTable,
    pub sound_on: bool,
    pub hint_duration_ms: u64,
    pub loss_return_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulties: DifficultyTable::standard(),
            sound_on: true,
            hint_duration_ms: HINT_DURATION_MS,
            loss_return_ms: LOSS_RETURN_MS,
        }
    }
}

/// One puzzle in progress
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub image: String,
    pub grid_size: usize,
    pub tier: TierConfig,
    pub permutation: Permutation,
    pub moves: u32,
    /// Countdown; stays 0 when untimed
    pub remaining_secs: u32,
    /// Seconds the timer has run
    pub elapsed_secs: u32,
}

impl Game {
    fn new(image: String, tier: TierConfig, permutation: Permutation) -> Self {
        Self {
            image,
            grid_size: permutation.grid_size(),
            tier,
            permutation,
            moves: 0,
            remaining_secs: tier.time_budget_secs,
            elapsed_secs: 0,
        }
    }

    /// Value shown on the timer: remaining when timed, else elapsed
    pub fn timer_secs(&self) -> u32 {
        if self.tier.is_timed() {
            self.remaining_secs
        } else {
            self.elapsed_secs
        }
    }

    pub fn time_taken_secs(&self) -> u32 {
        time_taken(
            self.tier.time_budget_secs,
            self.remaining_secs,
            self.elapsed_secs,
        )
    }
}

/// Score submission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// No win to submit
    Locked,
    Ready,
    /// Waiting for the store
    Pending,
    Done,
}

#[derive(Debug, Clone, Copy)]
struct ActiveHint {
    id: u64,
    hint: Hint,
}

pub struct Session {
    config: SessionConfig,
    screen: Screen,
    selected_image: Option<String>,
    game: Option<Game>,
    victory: Option<Victory>,
    submit: SubmitState,
    scheduler: Scheduler,
    drags: DragResolver,
    shuffler: Shuffler,
    hint: Option<ActiveHint>,
    next_hint_id: u64,
    gesture_seen: bool,
    sound_on: bool,
}

impl Session {
    pub fn new(config: SessionConfig, now_ms: u64) -> Self {
        Self {
            sound_on: config.sound_on,
            config,
            screen: Screen::Gallery,
            selected_image: None,
            game: None,
            victory: None,
            submit: SubmitState::Locked,
            scheduler: Scheduler::new(now_ms),
            drags: DragResolver::new(),
            shuffler: Shuffler::new(),
            hint: None,
            next_hint_id: 0,
            gesture_seen: false,
        }
    }

    /// Use a specific shuffler, e.g. a seeded one
    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn selected_image(&self) -> Option<&str> {
        self.selected_image.as_deref()
    }

    pub fn victory(&self) -> Option<&Victory> {
        self.victory.as_ref()
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit
    }

    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    pub fn gesture_seen(&self) -> bool {
        self.gesture_seen
    }

    pub fn active_hint(&self) -> Option<Hint> {
        self.hint.map(|h| h.hint)
    }

    pub fn active_drags(&self) -> usize {
        self.drags.active_count()
    }

    pub fn ticker_running(&self) -> bool {
        self.scheduler.ticker_running()
    }

    /// Replace the difficulty table; running games keep their tier
    pub fn set_difficulties(&mut self, difficulties: DifficultyTable) {
        self.config.difficulties = difficulties;
    }

    /// Bring the clock up to `now_ms`, then handle `event`
    pub fn dispatch<P: Presenter>(&mut self, now_ms: u64, event: Event, presenter: &mut P) {
        self.advance(now_ms, presenter);
        self.handle(event, presenter);
    }

    /// Fire every tick and timeout due at or before `now_ms`
    pub fn advance<P: Presenter>(&mut self, now_ms: u64, presenter: &mut P) {
        while let Some(due) = self.scheduler.next_due(now_ms) {
            let event = match due {
                Due::Tick => Event::Tick,
                Due::Timeout(timeout) => Event::Timeout(timeout),
            };
            self.handle(event, presenter);
        }
    }

    pub fn handle<P: Presenter>(&mut self, event: Event, presenter: &mut P) {
        if event.is_gesture() && !self.gesture_seen {
            self.first_gesture(presenter);
        }

        match event {
            Event::UserGesture => {}
            Event::SelectImage(image) => self.select_image(image, presenter),
            Event::OpenDifficultyDialog => self.open_difficulty_dialog(presenter),
            Event::CloseDifficultyDialog => self.close_difficulty_dialog(presenter),
            Event::ChooseDifficulty(grid_size) => self.choose_difficulty(grid_size, presenter),
            Event::Pointer(pointer) => self.pointer(pointer, presenter),
            Event::RequestHint => self.request_hint(presenter),
            Event::Shuffle => self.shuffle(presenter),
            Event::Restart => self.restart(presenter),
            Event::ReturnToGallery => self.return_to_gallery(presenter),
            Event::ToggleSound => self.toggle_sound(presenter),
            Event::CloseLeaderboard => presenter.hide_modal(Modal::Leaderboard),
            Event::Tick => self.tick(presenter),
            Event::Timeout(Timeout::HintExpired(id)) => self.hint_expired(id, presenter),
            Event::Timeout(Timeout::LossReturn) => {
                if self.screen == Screen::Lost {
                    self.return_to_gallery(presenter);
                }
            }
        }
    }

    /// Start a game from a known arrangement
    pub fn load_game<P: Presenter>(
        &mut self,
        image: impl Into<String>,
        permutation: Permutation,
        presenter: &mut P,
    ) {
        let image = image.into();
        let tier = self.config.difficulties.tier(permutation.grid_size());
        self.selected_image = Some(image.clone());
        self.begin_game(image, tier, permutation, presenter);
    }

    // ==================== Navigation ====================

    fn set_screen<P: Presenter>(&mut self, screen: Screen, presenter: &mut P) {
        if self.screen != screen {
            log::debug!("screen {:?} -> {:?}", self.screen, screen);
        }
        self.screen = screen;
        presenter.show_screen(screen);
    }

    fn select_image<P: Presenter>(&mut self, image: String, presenter: &mut P) {
        let selectable = match self.screen {
            Screen::Gallery => true,
            Screen::DifficultySelect => self.game.is_none(),
            _ => false,
        };
        if !selectable {
            log::debug!("ignoring image selection on {:?}", self.screen);
            return;
        }
        self.selected_image = Some(image);
        presenter.show_modal(Modal::Difficulty);
        self.set_screen(Screen::DifficultySelect, presenter);
    }

    fn open_difficulty_dialog<P: Presenter>(&mut self, presenter: &mut P) {
        match self.screen {
            Screen::Active => {
                self.scheduler.stop_ticker();
                self.release_all(presenter);
                self.render(presenter);
                presenter.show_modal(Modal::Difficulty);
                self.set_screen(Screen::Paused, presenter);
            }
            Screen::Won | Screen::Lost => {
                self.scheduler.cancel(|t| *t == Timeout::LossReturn);
                presenter.hide_modal(Modal::Victory);
                presenter.hide_modal(Modal::GameOver);
                presenter.show_modal(Modal::Difficulty);
                self.set_screen(Screen::DifficultySelect, presenter);
            }
            _ => {}
        }
    }

    fn close_difficulty_dialog<P: Presenter>(&mut self, presenter: &mut P) {
        match self.screen {
            Screen::Paused => {
                presenter.hide_modal(Modal::Difficulty);
                self.resume(presenter);
            }
            Screen::DifficultySelect => self.return_to_gallery(presenter),
            _ => {}
        }
    }

    fn choose_difficulty<P: Presenter>(&mut self, grid_size: usize, presenter: &mut P) {
        if !matches!(self.screen, Screen::DifficultySelect | Screen::Paused) {
            return;
        }
        if !is_valid_grid_size(grid_size) {
            presenter.notify(&format!(
                "Grid size must be between {}x{} and {}x{}",
                MIN_GRID_SIZE, MIN_GRID_SIZE, MAX_GRID_SIZE, MAX_GRID_SIZE
            ));
            return;
        }
        presenter.hide_modal(Modal::Difficulty);

        let same_game = self.screen == Screen::Paused
            && self.game.as_ref().is_some_and(|g| {
                g.grid_size == grid_size && self.selected_image.as_ref() == Some(&g.image)
            });
        if same_game {
            self.resume(presenter);
            return;
        }

        match self.selected_image.clone() {
            Some(image) => self.start_game(image, grid_size, presenter),
            None => self.return_to_gallery(presenter),
        }
    }

    fn resume<P: Presenter>(&mut self, presenter: &mut P) {
        log::debug!("resuming current game");
        self.scheduler.start_ticker();
        self.set_screen(Screen::Active, presenter);
    }

    fn restart<P: Presenter>(&mut self, presenter: &mut P) {
        if self.screen == Screen::Gallery || self.screen == Screen::DifficultySelect {
            return;
        }
        if let Some((image, grid_size)) = self.game.as_ref().map(|g| (g.image.clone(), g.grid_size)) {
            self.start_game(image, grid_size, presenter);
        }
    }

    fn return_to_gallery<P: Presenter>(&mut self, presenter: &mut P) {
        self.scheduler.stop_ticker();
        self.scheduler.cancel_all();
        self.release_all(presenter);
        if self.hint.take().is_some() {
            presenter.clear_hint();
        }
        self.game = None;
        self.victory = None;
        self.selected_image = None;
        self.submit = SubmitState::Locked;
        for modal in Modal::ALL {
            presenter.hide_modal(modal);
        }
        presenter.pause_cue(Cue::Background);
        self.set_screen(Screen::Gallery, presenter);
    }

    // ==================== Game lifecycle ====================

    fn start_game<P: Presenter>(&mut self, image: String, grid_size: usize, presenter: &mut P) {
        let tier = self.config.difficulties.tier(grid_size);
        let mut permutation = match Permutation::try_identity(grid_size) {
            Ok(perm) => perm,
            Err(e) => {
                log::warn!("cannot start game: {}", e);
                presenter.notify(&e.to_string());
                return;
            }
        };
        self.shuffler.scramble(&mut permutation);
        self.begin_game(image, tier, permutation, presenter);
    }

    fn begin_game<P: Presenter>(
        &mut self,
        image: String,
        tier: TierConfig,
        permutation: Permutation,
        presenter: &mut P,
    ) {
        self.release_all(presenter);
        self.clear_hint(presenter);
        self.scheduler.cancel(|t| *t == Timeout::LossReturn);
        self.victory = None;
        self.submit = SubmitState::Locked;
        presenter.set_submit_enabled(false);
        for modal in Modal::ALL {
            presenter.hide_modal(modal);
        }

        let game = Game::new(image, tier, permutation);
        log::info!(
            "starting {} game ({}s budget) with {}",
            difficulty_label(game.grid_size),
            tier.time_budget_secs,
            game.image
        );
        presenter.build_board(&game.image, game.grid_size);
        presenter.set_difficulty_label(&format!(
            "Difficulty: {} × {}",
            game.grid_size, game.grid_size
        ));
        presenter.set_moves_text("0");
        presenter.set_timer_text(&format_time(game.timer_secs()));
        self.game = Some(game);
        self.render(presenter);

        self.set_screen(Screen::Active, presenter);
        self.scheduler.start_ticker();
        if self.audio_allowed() {
            presenter.play_cue(Cue::Background);
        }
    }

    fn render<P: Presenter>(&self, presenter: &mut P) {
        if let Some(game) = &self.game {
            presenter.render(&board::layout(&game.permutation));
        }
    }

    fn tick<P: Presenter>(&mut self, presenter: &mut P) {
        if self.screen != Screen::Active {
            return;
        }
        let Some(game) = self.game.as_mut() else {
            return;
        };
        game.elapsed_secs += 1;
        if game.tier.is_timed() {
            game.remaining_secs = game.remaining_secs.saturating_sub(1);
        }
        let out_of_time = game.tier.is_timed() && game.remaining_secs == 0;
        presenter.set_timer_text(&format_time(game.timer_secs()));
        if out_of_time {
            self.lose(presenter);
        }
    }

    fn win<P: Presenter>(&mut self, presenter: &mut P) {
        let Some(game) = &self.game else {
            return;
        };
        let victory = Victory::new(&game.tier, game.grid_size, game.moves, game.time_taken_secs());
        log::info!(
            "solved {} in {} moves, {} ({} points)",
            difficulty_label(victory.grid_size),
            victory.moves,
            victory.time_string(),
            victory.score
        );

        self.scheduler.stop_ticker();
        self.release_all(presenter);
        self.clear_hint(presenter);
        presenter.pause_cue(Cue::Background);
        if self.audio_allowed() {
            presenter.play_cue(Cue::Fanfare);
        }
        presenter.show_victory(&victory);
        presenter.show_modal(Modal::Victory);
        self.victory = Some(victory);
        self.submit = SubmitState::Ready;
        presenter.set_submit_enabled(true);
        self.set_screen(Screen::Won, presenter);
    }

    fn lose<P: Presenter>(&mut self, presenter: &mut P) {
        log::info!("time is up");
        self.scheduler.stop_ticker();
        self.release_all(presenter);
        self.clear_hint(presenter);
        presenter.pause_cue(Cue::Background);
        presenter.show_modal(Modal::GameOver);
        self.set_screen(Screen::Lost, presenter);
        self.scheduler
            .schedule(Timeout::LossReturn, self.config.loss_return_ms);
    }

    // ==================== Board input ====================

    fn pointer<P: Presenter>(&mut self, event: PointerEvent, presenter: &mut P) {
        if self.screen != Screen::Active {
            return;
        }
        let PointerEvent { kind, pointer, x, y } = event;
        match kind {
            PointerEventKind::Down => {
                let Some(cell) = presenter.tile_at(x, y) else {
                    return;
                };
                let geometry = presenter.board_geometry();
                if self.drags.begin(pointer, cell, &geometry).is_some() {
                    presenter.lift_tile(pointer, cell);
                }
            }
            PointerEventKind::Move => {
                let Some(drag) = self.drags.session(pointer) else {
                    return;
                };
                let origin = drag.origin;
                let (dx, dy) = drag.follow_offset(x, y);
                presenter.move_lifted_tile(origin, dx, dy);
                if let Some(change) = self.drags.update(pointer, x, y, &*presenter) {
                    if let Some(previous) = change.previous {
                        presenter.set_hover(previous, false);
                    }
                    if let Some(current) = change.current {
                        presenter.set_hover(current, true);
                    }
                }
            }
            PointerEventKind::Up => {
                let geometry = presenter.board_geometry();
                let Some((drag, outcome)) = self.drags.finish(pointer, x, y, &geometry) else {
                    return;
                };
                release(&drag, presenter);
                match outcome {
                    DropOutcome::Swap { from, to } => self.apply_swap(from, to, presenter),
                    DropOutcome::Cancelled { .. } => self.render(presenter),
                }
            }
            PointerEventKind::Cancel => {
                if let Some(drag) = self.drags.cancel(pointer) {
                    release(&drag, presenter);
                    self.render(presenter);
                }
            }
        }
    }

    fn apply_swap<P: Presenter>(&mut self, from: CellIndex, to: CellIndex, presenter: &mut P) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.permutation.swap(from, to) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                log::warn!("rejected swap {} <-> {}: {}", from, to, e);
                return;
            }
        }
        game.moves += 1;
        let moves = game.moves;
        let solved = game.permutation.is_solved();
        log::debug!("swapped {} <-> {} (move {})", from, to, moves);

        for other in self.drags.cancel_touching(&[from, to]) {
            release(&other, presenter);
        }
        self.clear_hint(presenter);
        if self.audio_allowed() {
            presenter.play_cue(Cue::Swap);
        }
        self.render(presenter);
        presenter.set_moves_text(&moves.to_string());
        if solved {
            self.win(presenter);
        }
    }

    fn shuffle<P: Presenter>(&mut self, presenter: &mut P) {
        if self.screen != Screen::Active {
            return;
        }
        self.release_all(presenter);
        self.clear_hint(presenter);
        if let Some(game) = self.game.as_mut() {
            self.shuffler.scramble(&mut game.permutation);
            log::debug!("reshuffled {} board", difficulty_label(game.grid_size));
        }
        self.render(presenter);
    }

    fn release_all<P: Presenter>(&mut self, presenter: &mut P) {
        for drag in self.drags.cancel_all() {
            release(&drag, presenter);
        }
    }

    // ==================== Hints ====================

    fn request_hint<P: Presenter>(&mut self, presenter: &mut P) {
        if self.screen != Screen::Active {
            return;
        }
        let Some(hint) = self.game.as_ref().and_then(|g| compute_hint(&g.permutation)) else {
            return;
        };
        self.clear_hint(presenter);
        self.next_hint_id += 1;
        let id = self.next_hint_id;
        presenter.show_hint(&hint);
        self.hint = Some(ActiveHint { id, hint });
        self.scheduler
            .schedule(Timeout::HintExpired(id), self.config.hint_duration_ms);
    }

    fn clear_hint<P: Presenter>(&mut self, presenter: &mut P) {
        if let Some(active) = self.hint.take() {
            self.scheduler
                .cancel(|t| *t == Timeout::HintExpired(active.id));
            presenter.clear_hint();
        }
    }

    fn hint_expired<P: Presenter>(&mut self, id: u64, presenter: &mut P) {
        match self.hint {
            Some(active) if active.id == id => {
                self.hint = None;
                presenter.clear_hint();
            }
            _ => log::debug!("ignoring stale hint timeout {}", id),
        }
    }

    // ==================== Audio ====================

    fn audio_allowed(&self) -> bool {
        self.sound_on && self.gesture_seen
    }

    fn first_gesture<P: Presenter>(&mut self, presenter: &mut P) {
        self.gesture_seen = true;
        if self.sound_on && self.screen == Screen::Active {
            presenter.play_cue(Cue::Background);
        }
    }

    fn toggle_sound<P: Presenter>(&mut self, presenter: &mut P) {
        self.sound_on = !self.sound_on;
        log::debug!("sound {}", if self.sound_on { "on" } else { "off" });
        if !self.sound_on {
            presenter.pause_cue(Cue::Background);
        } else if self.gesture_seen && self.screen == Screen::Active {
            presenter.play_cue(Cue::Background);
        }
    }

    // ==================== Leaderboard ====================

    /// Validate the nickname and lock the gate for an outgoing submission.
    ///
    /// On success the returned record must be handed to a store and the
    /// outcome reported through [`Session::finish_submission`].
    pub fn begin_submission<P: Presenter>(
        &mut self,
        nickname: &str,
        now_ms: u64,
        presenter: &mut P,
    ) -> LeaderboardResult<ScoreRecord> {
        match self.submit {
            SubmitState::Pending => return Err(LeaderboardError::SubmissionPending),
            SubmitState::Locked | SubmitState::Done => {
                return Err(LeaderboardError::NothingToSubmit)
            }
            SubmitState::Ready => {}
        }
        let victory = self
            .victory
            .as_ref()
            .ok_or(LeaderboardError::NothingToSubmit)?;
        let nickname = match validate_nickname(nickname) {
            Ok(nickname) => nickname,
            Err(e) => {
                presenter.notify(&e.to_string());
                return Err(e);
            }
        };

        let record = ScoreRecord::from_victory(nickname, victory, now_ms);
        log::info!("submitting {} points for {}", record.score, record.nickname);
        self.submit = SubmitState::Pending;
        presenter.set_submit_enabled(false);
        Ok(record)
    }

    /// Report the store's answer to a submission
    pub fn finish_submission<P: Presenter>(
        &mut self,
        result: LeaderboardResult<LeaderboardView>,
        presenter: &mut P,
    ) {
        let was_pending = self.submit == SubmitState::Pending;
        match result {
            Ok(view) => {
                if was_pending {
                    self.submit = SubmitState::Done;
                }
                presenter.hide_modal(Modal::Victory);
                self.show_leaderboard(Ok(view), presenter);
            }
            Err(e) => {
                log::warn!("score submission failed: {}", e);
                if was_pending {
                    self.submit = SubmitState::Ready;
                    presenter.set_submit_enabled(true);
                }
                presenter.notify(&format!("Could not submit score: {}", e));
            }
        }
    }

    /// Submit through a synchronous manager
    pub fn submit_score<P: Presenter>(
        &mut self,
        nickname: &str,
        now_ms: u64,
        manager: &LeaderboardManager,
        presenter: &mut P,
    ) -> LeaderboardResult<()> {
        let record = self.begin_submission(nickname, now_ms, presenter)?;
        let result = manager.submit(record);
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.clone());
        self.finish_submission(result, presenter);
        outcome
    }

    /// Show a fetched leaderboard, or a notice when the fetch failed
    pub fn show_leaderboard<P: Presenter>(
        &self,
        result: LeaderboardResult<LeaderboardView>,
        presenter: &mut P,
    ) {
        match result {
            Ok(view) => {
                presenter.show_leaderboard(&view);
                presenter.show_modal(Modal::Leaderboard);
            }
            Err(e) => {
                log::warn!("leaderboard unavailable: {}", e);
                presenter.notify(&format!("Could not load leaderboard: {}", e));
            }
        }
    }
}

fn release<P: Presenter>(drag: &DragSession, presenter: &mut P) {
    if let Some(hover) = drag.hover {
        presenter.set_hover(hover, false);
    }
    presenter.release_tile(drag.pointer, drag.origin);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerId;
    use crate::leaderboard::{MemoryStore, MockLeaderboard};
    use crate::presenter::{PresenterCall, RecordingPresenter};

    const IMAGE: &str = "assets/images/PUZZLE1.png";

    fn session() -> Session {
        Session::new(SessionConfig::default(), 0).with_shuffler(Shuffler::with_seed(7))
    }

    fn drag(
        session: &mut Session,
        presenter: &mut RecordingPresenter,
        from: CellIndex,
        to: CellIndex,
    ) {
        let p = PointerId(1);
        let (fx, fy) = presenter.geometry.cell_center(from);
        let (tx, ty) = presenter.geometry.cell_center(to);
        session.handle(Event::Pointer(PointerEvent::down(p, fx, fy)), presenter);
        session.handle(Event::Pointer(PointerEvent::moved(p, tx, ty)), presenter);
        session.handle(Event::Pointer(PointerEvent::up(p, tx, ty)), presenter);
    }

    /// 2x2 game one swap away from solved
    fn nearly_solved(presenter: &mut RecordingPresenter) -> Session {
        let mut s = session();
        let perm = Permutation::from_pieces(2, vec![1, 0, 2, 3]).unwrap();
        s.load_game(IMAGE, perm, presenter);
        s
    }

    #[test]
    fn test_swap_into_solved_wins() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        assert!(!s.game().unwrap().permutation.is_solved());

        drag(&mut s, &mut presenter, 0, 1);

        let game = s.game().unwrap();
        assert!(game.permutation.is_solved());
        assert_eq!(game.moves, 1);
        assert_eq!(s.screen(), Screen::Won);
        assert!(!s.ticker_running());
        assert_eq!(s.submit_state(), SubmitState::Ready);
        assert!(presenter.contains(&PresenterCall::ShowModal(Modal::Victory)));
        assert!(presenter.contains(&PresenterCall::MovesText("1".into())));
        assert_eq!(s.victory().unwrap().moves, 1);
    }

    #[test]
    fn test_input_disabled_after_win() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        drag(&mut s, &mut presenter, 0, 1);
        drag(&mut s, &mut presenter, 2, 3);
        assert_eq!(s.game().unwrap().moves, 1);
        assert!(s.game().unwrap().permutation.is_solved());
    }

    #[test]
    fn test_drop_outside_board_snaps_back() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        let p = PointerId(3);
        s.handle(Event::Pointer(PointerEvent::down(p, 100.0, 100.0)), &mut presenter);
        assert!(presenter.contains(&PresenterCall::LiftTile(p, 0)));
        presenter.take();

        s.handle(Event::Pointer(PointerEvent::up(p, 900.0, 900.0)), &mut presenter);
        assert_eq!(s.game().unwrap().moves, 0);
        assert_eq!(s.active_drags(), 0);
        assert!(presenter.contains(&PresenterCall::ReleaseTile(p, 0)));
        assert!(presenter.last_layout().is_some());
    }

    #[test]
    fn test_hover_highlight_follows_pointer() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        let p = PointerId(1);
        s.handle(Event::Pointer(PointerEvent::down(p, 100.0, 100.0)), &mut presenter);
        s.handle(Event::Pointer(PointerEvent::moved(p, 300.0, 100.0)), &mut presenter);
        s.handle(Event::Pointer(PointerEvent::moved(p, 100.0, 300.0)), &mut presenter);
        assert!(presenter.contains(&PresenterCall::SetHover(1, true)));
        assert!(presenter.contains(&PresenterCall::SetHover(1, false)));
        assert!(presenter.contains(&PresenterCall::SetHover(2, true)));

        s.handle(Event::Pointer(PointerEvent::cancel(p)), &mut presenter);
        assert!(presenter.contains(&PresenterCall::SetHover(2, false)));
        assert_eq!(
            presenter.count(|c| matches!(c, PresenterCall::ReleaseTile(..))),
            1
        );
        assert_eq!(s.game().unwrap().moves, 0);
    }

    #[test]
    fn test_same_size_resumes_without_reshuffle() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        s.handle(Event::SelectImage(IMAGE.into()), &mut presenter);
        assert_eq!(s.screen(), Screen::DifficultySelect);
        s.handle(Event::ChooseDifficulty(4), &mut presenter);
        assert_eq!(s.screen(), Screen::Active);

        drag(&mut s, &mut presenter, 0, 1);
        let before = s.game().unwrap().clone();
        assert_eq!(before.moves, 1);

        s.handle(Event::OpenDifficultyDialog, &mut presenter);
        assert_eq!(s.screen(), Screen::Paused);
        assert!(!s.ticker_running());

        // Paused boards ignore ticks and input
        s.advance(5000, &mut presenter);
        drag(&mut s, &mut presenter, 2, 3);
        assert_eq!(s.game().unwrap(), &before);

        s.handle(Event::ChooseDifficulty(4), &mut presenter);
        assert_eq!(s.screen(), Screen::Active);
        assert_eq!(s.game().unwrap(), &before);
    }

    #[test]
    fn test_different_size_starts_fresh() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        s.handle(Event::SelectImage(IMAGE.into()), &mut presenter);
        s.handle(Event::ChooseDifficulty(4), &mut presenter);
        drag(&mut s, &mut presenter, 0, 1);

        s.handle(Event::OpenDifficultyDialog, &mut presenter);
        s.handle(Event::ChooseDifficulty(6), &mut presenter);
        let game = s.game().unwrap();
        assert_eq!(game.grid_size, 6);
        assert_eq!(game.moves, 0);
        assert_eq!(game.remaining_secs, 300);
        assert!(!game.permutation.is_solved());
    }

    #[test]
    fn test_untimed_never_loses() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        let mut perm = Permutation::identity(5);
        perm.swap(0, 1).unwrap();
        s.load_game(IMAGE, perm, &mut presenter);
        assert!(!s.game().unwrap().tier.is_timed());

        s.advance(10_000_000, &mut presenter);
        assert_eq!(s.screen(), Screen::Active);
        assert_eq!(s.game().unwrap().elapsed_secs, 10_000);
        assert_eq!(presenter.last_timer_text(), Some("166:40"));
    }

    #[test]
    fn test_countdown_loses_then_returns_to_gallery() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        // 2x2 is untimed in the standard table; use a timed one
        let mut table = DifficultyTable::standard();
        table.insert(2, TierConfig::new(3, 100.0, 1.0)).unwrap();
        s.set_difficulties(table);
        let perm = Permutation::from_pieces(2, vec![1, 0, 2, 3]).unwrap();
        s.load_game(IMAGE, perm, &mut presenter);
        assert_eq!(presenter.last_timer_text(), Some("00:03"));

        s.advance(2999, &mut presenter);
        assert_eq!(s.screen(), Screen::Active);
        s.advance(3000, &mut presenter);
        assert_eq!(s.screen(), Screen::Lost);
        assert_eq!(presenter.last_timer_text(), Some("00:00"));
        assert!(presenter.contains(&PresenterCall::ShowModal(Modal::GameOver)));

        drag(&mut s, &mut presenter, 0, 1);
        assert_eq!(s.game().unwrap().moves, 0);

        s.advance(5999, &mut presenter);
        assert_eq!(s.screen(), Screen::Lost);
        s.advance(6000, &mut presenter);
        assert_eq!(s.screen(), Screen::Gallery);
        assert!(s.game().is_none());
    }

    #[test]
    fn test_new_game_cancels_loss_return() {
        let mut presenter = RecordingPresenter::default();
        let mut table = DifficultyTable::standard();
        table.insert(2, TierConfig::new(1, 100.0, 1.0)).unwrap();
        let config = SessionConfig {
            difficulties: table,
            ..SessionConfig::default()
        };
        let mut s = Session::new(config, 0).with_shuffler(Shuffler::with_seed(1));
        s.load_game(IMAGE, Permutation::from_pieces(2, vec![1, 0, 2, 3]).unwrap(), &mut presenter);
        s.advance(1000, &mut presenter);
        assert_eq!(s.screen(), Screen::Lost);

        s.handle(Event::Restart, &mut presenter);
        assert_eq!(s.screen(), Screen::Active);
        s.advance(4500, &mut presenter);
        // Lost again at 2000; the first loss's return at 4000 is gone
        assert_eq!(s.screen(), Screen::Lost);
        s.advance(5000, &mut presenter);
        assert_eq!(s.screen(), Screen::Gallery);
    }

    #[test]
    fn test_hint_expires_and_clears_on_swap() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        let mut perm = Permutation::identity(3);
        perm.swap(2, 5).unwrap();
        perm.swap(6, 7).unwrap();
        s.load_game(IMAGE, perm, &mut presenter);

        s.dispatch(100, Event::RequestHint, &mut presenter);
        let hint = s.active_hint().unwrap();
        assert_eq!((hint.source, hint.destination), (2, 5));
        s.advance(3099, &mut presenter);
        assert!(s.active_hint().is_some());
        s.advance(3100, &mut presenter);
        assert!(s.active_hint().is_none());
        assert_eq!(presenter.count(|c| *c == PresenterCall::ClearHint), 1);

        s.dispatch(4000, Event::RequestHint, &mut presenter);
        drag(&mut s, &mut presenter, 2, 5);
        assert!(s.active_hint().is_none());
        assert_eq!(presenter.count(|c| *c == PresenterCall::ClearHint), 2);
        // The cancelled timeout never clears anything
        s.advance(10_000, &mut presenter);
        assert_eq!(presenter.count(|c| *c == PresenterCall::ClearHint), 2);
    }

    #[test]
    fn test_shuffle_keeps_stats() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        s.handle(Event::SelectImage(IMAGE.into()), &mut presenter);
        s.handle(Event::ChooseDifficulty(4), &mut presenter);
        drag(&mut s, &mut presenter, 0, 1);
        s.advance(2000, &mut presenter);

        s.handle(Event::Shuffle, &mut presenter);
        let game = s.game().unwrap();
        assert_eq!(game.moves, 1);
        assert_eq!(game.remaining_secs, 118);
        assert!(!game.permutation.is_solved());
    }

    #[test]
    fn test_audio_waits_for_first_gesture() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        assert!(!presenter.contains(&PresenterCall::PlayCue(Cue::Background)));

        s.handle(Event::UserGesture, &mut presenter);
        assert!(presenter.contains(&PresenterCall::PlayCue(Cue::Background)));

        s.handle(Event::ToggleSound, &mut presenter);
        assert!(!s.sound_on());
        assert!(presenter.contains(&PresenterCall::PauseCue(Cue::Background)));

        presenter.take();
        drag(&mut s, &mut presenter, 0, 1);
        assert!(!presenter.contains(&PresenterCall::PlayCue(Cue::Swap)));
        assert!(!presenter.contains(&PresenterCall::PlayCue(Cue::Fanfare)));
    }

    #[test]
    fn test_submission_gate() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        assert_eq!(
            s.begin_submission("ace", 0, &mut presenter),
            Err(LeaderboardError::NothingToSubmit)
        );
        drag(&mut s, &mut presenter, 0, 1);

        assert_eq!(
            s.begin_submission("   ", 0, &mut presenter),
            Err(LeaderboardError::InvalidNickname)
        );
        assert_eq!(s.submit_state(), SubmitState::Ready);

        let record = s.begin_submission(" ace ", 1_760_832_000_000, &mut presenter).unwrap();
        assert_eq!(record.nickname, "ace");
        assert_eq!(record.difficulty, "2x2");
        assert_eq!(record.date, "2025-10-19");
        assert_eq!(s.submit_state(), SubmitState::Pending);
        assert_eq!(
            s.begin_submission("ace", 0, &mut presenter),
            Err(LeaderboardError::SubmissionPending)
        );

        s.finish_submission(Err(LeaderboardError::NetworkError("offline".into())), &mut presenter);
        assert_eq!(s.submit_state(), SubmitState::Ready);

        let manager = LeaderboardManager::new(Box::new(MockLeaderboard::new(MemoryStore::new())));
        s.submit_score("ace", 5, &manager, &mut presenter).unwrap();
        assert_eq!(s.submit_state(), SubmitState::Done);
        assert_eq!(manager.list().unwrap().entries().len(), 1);
        assert!(presenter.contains(&PresenterCall::ShowModal(Modal::Leaderboard)));
        assert_eq!(
            s.submit_score("ace", 6, &manager, &mut presenter),
            Err(LeaderboardError::NothingToSubmit)
        );
    }

    #[test]
    fn test_oversized_grid_stays_in_dialog() {
        let mut presenter = RecordingPresenter::default();
        let mut s = session();
        s.handle(Event::SelectImage(IMAGE.to_string()), &mut presenter);
        presenter.take();

        s.handle(Event::ChooseDifficulty(1usize << 33), &mut presenter);
        s.handle(Event::ChooseDifficulty(MAX_GRID_SIZE + 1), &mut presenter);
        assert_eq!(s.screen(), Screen::DifficultySelect);
        assert!(s.game().is_none());
        assert_eq!(
            presenter.count(|c| matches!(c, PresenterCall::Notify(_))),
            2
        );
        assert!(!presenter.contains(&PresenterCall::HideModal(Modal::Difficulty)));

        s.handle(Event::ChooseDifficulty(MAX_GRID_SIZE), &mut presenter);
        assert_eq!(s.screen(), Screen::Active);
        assert_eq!(s.game().map(|g| g.permutation.len()), Some(MAX_GRID_SIZE * MAX_GRID_SIZE));
    }

    #[test]
    fn test_return_to_gallery_discards_game() {
        let mut presenter = RecordingPresenter::default();
        let mut s = nearly_solved(&mut presenter);
        s.handle(Event::ReturnToGallery, &mut presenter);
        assert_eq!(s.screen(), Screen::Gallery);
        assert!(s.game().is_none());
        assert!(!s.ticker_running());
        assert_eq!(presenter.last_screen(), Some(Screen::Gallery));
    }
}
