use crate::app::{App, KEYBOARD};
use crate::presenter::{BOARD_LEFT, BOARD_TOP};
use crate::theme::Theme;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use jigsaw_core::{format_time, LeaderboardView, Modal, Position, Rect, Screen};
use std::io;

pub fn render(stdout: &mut io::Stdout, app: &mut App) -> io::Result<()> {
    let (term_width, term_height) = terminal::size()?;
    app.view.set_viewport(term_width, term_height);

    execute!(stdout, Hide, SetBackgroundColor(app.theme.bg), Clear(ClearType::All))?;

    match app.session.screen() {
        Screen::Gallery | Screen::DifficultySelect => {
            render_gallery(stdout, app, term_width)?;
        }
        Screen::Active | Screen::Paused | Screen::Won | Screen::Lost => {
            render_board(stdout, app)?;
            let info_x = BOARD_LEFT + app.view.geometry().rect.width as u16 + 3;
            render_info_panel(stdout, app, info_x, BOARD_TOP)?;
            let controls_y = BOARD_TOP + app.view.geometry().rect.height as u16 + 1;
            render_controls(stdout, app, BOARD_LEFT, controls_y)?;
        }
    }

    if let Some(modal) = app.view.top_modal() {
        match modal {
            Modal::Difficulty => render_difficulty_menu(stdout, app, term_width, term_height)?,
            Modal::Victory => render_victory(stdout, app, term_width, term_height)?,
            Modal::GameOver => render_game_over(stdout, app, term_width, term_height)?,
            Modal::Leaderboard => render_leaderboard(stdout, app, term_width, term_height)?,
        }
    }

    if let Some(msg) = app.view.message() {
        render_message(stdout, app, msg, term_width)?;
    }

    if app.view.take_bell() {
        execute!(stdout, Print('\u{7}'))?;
    }

    execute!(stdout, Show)?;
    Ok(())
}

fn render_gallery(stdout: &mut io::Stdout, app: &App, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;

    let title = "═══ JIGSAW ═══";
    let title_x = term_width.saturating_sub(title.chars().count() as u16) / 2;
    execute!(
        stdout,
        MoveTo(title_x, 1),
        SetForegroundColor(theme.key),
        Print(title),
        MoveTo(4, 3),
        SetForegroundColor(theme.info),
        Print("Choose a picture:")
    )?;

    for i in 0..app.catalog.len() {
        let name = app.catalog.name(i).unwrap_or_default();
        let selected = i == app.gallery_selection;
        let (marker, color) = if selected {
            ("▶ ", theme.key)
        } else {
            ("  ", theme.fg)
        };
        execute!(
            stdout,
            MoveTo(6, 5 + i as u16),
            SetForegroundColor(color),
            Print(format!("{}{}", marker, name))
        )?;
    }

    let help_y = 6 + app.catalog.len() as u16;
    let controls = [
        ("↑↓", "Pick"),
        ("Enter", "Open"),
        ("r", "Random"),
        ("b", "Leaderboard"),
        ("m", "Sound"),
        ("q", "Quit"),
    ];
    render_key_rows(stdout, app, &controls, 4, help_y, 3)
}

/// Top-left terminal cell of a board cell
fn cell_origin(rect: Rect) -> (u16, u16) {
    (rect.left.max(0.0) as u16, rect.top.max(0.0) as u16)
}

fn render_board(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let theme = &app.theme;
    let view = &app.view;
    let geometry = *view.geometry();
    let Some(layout) = view.layout.as_ref() else {
        return Ok(());
    };
    let n = layout.grid_size;
    let show_cursor = app.session.screen() == Screen::Active;

    // Frame
    let (left, top) = cell_origin(geometry.rect);
    let width = geometry.rect.width as u16;
    let height = geometry.rect.height as u16;
    execute!(
        stdout,
        SetBackgroundColor(theme.bg),
        SetForegroundColor(theme.border),
        MoveTo(left.saturating_sub(1), top.saturating_sub(1)),
        Print(format!("┌{}┐", "─".repeat(width as usize))),
        MoveTo(left.saturating_sub(1), top + height),
        Print(format!("└{}┘", "─".repeat(width as usize)))
    )?;
    for row in 0..height {
        execute!(
            stdout,
            MoveTo(left.saturating_sub(1), top + row),
            Print("│"),
            MoveTo(left + width, top + row),
            Print("│")
        )?;
    }

    for cell in 0..n * n {
        let Some(tile) = layout.tile_at_cell(cell) else {
            continue;
        };
        let rect = geometry.cell_rect(cell);
        if view.is_lifted(cell) {
            draw_tile(stdout, rect, theme.lifted_bg, theme.fg, "")?;
            continue;
        }
        let bg = if view.is_hovered(cell) {
            theme.hover_bg
        } else {
            Theme::piece_color(tile.piece, n)
        };
        let hinted = view
            .hint
            .is_some_and(|h| h.source == cell || h.destination == cell);
        let fg = if hinted { theme.error } else { theme.tile_fg };
        let label = if hinted {
            format!("*{}*", tile.piece + 1)
        } else {
            (tile.piece + 1).to_string()
        };
        draw_tile(stdout, rect, bg, fg, &label)?;
    }

    if show_cursor {
        draw_cursor(stdout, app, geometry.cell_rect(app.cursor))?;
    }

    // Lifted tiles float above the grid
    for cell in 0..n * n {
        let (Some((dx, dy)), Some(tile)) = (view.lifted_offset(cell), layout.tile_at_cell(cell))
        else {
            continue;
        };
        let at = geometry.cell_rect(cell);
        let rect = Rect::new(
            geometry.rect.left + dx.round(),
            geometry.rect.top + dy.round(),
            at.width,
            at.height,
        );
        draw_tile(
            stdout,
            rect,
            Theme::piece_color(tile.piece, n),
            theme.tile_fg,
            &(tile.piece + 1).to_string(),
        )?;
    }

    Ok(())
}

fn draw_tile(stdout: &mut io::Stdout, rect: Rect, bg: Color, fg: Color, label: &str) -> io::Result<()> {
    let (x, y) = cell_origin(rect);
    let w = rect.width as usize;
    let h = rect.height as u16;
    execute!(stdout, SetBackgroundColor(bg), SetForegroundColor(fg))?;
    for row in 0..h {
        let text = if row == h / 2 {
            format!("{:^w$}", label, w = w)
        } else {
            " ".repeat(w)
        };
        execute!(stdout, MoveTo(x, y + row), Print(text))?;
    }
    Ok(())
}

fn draw_cursor(stdout: &mut io::Stdout, app: &App, rect: Rect) -> io::Result<()> {
    let (x, y) = cell_origin(rect);
    let w = rect.width as u16;
    let h = rect.height as u16;
    let color = if app.view.lifted_cell(KEYBOARD).is_some() {
        app.theme.key
    } else {
        app.theme.cursor
    };
    execute!(stdout, SetBackgroundColor(app.theme.bg), SetForegroundColor(color))?;
    let mid = y + h / 2;
    execute!(
        stdout,
        MoveTo(x, mid),
        Print("["),
        MoveTo(x + w.saturating_sub(1), mid),
        Print("]")
    )?;
    Ok(())
}

fn render_info_panel(stdout: &mut io::Stdout, app: &App, x: u16, y: u16) -> io::Result<()> {
    let theme = &app.theme;
    let view = &app.view;

    let image = app
        .session
        .game()
        .map(|g| g.image.rsplit('/').next().unwrap_or(&g.image).to_string())
        .unwrap_or_default();
    let cursor_at = Position::from_index(app.cursor, app.grid_size().max(1));

    let rows: [(&str, String, Color); 6] = [
        ("Image", image, theme.fg),
        ("", view.difficulty_label.clone(), theme.key),
        ("Time", view.timer_text.clone(), timer_color(app)),
        ("Moves", view.moves_text.clone(), theme.fg),
        (
            "Cursor",
            format!("row {} col {}", cursor_at.row + 1, cursor_at.col + 1),
            theme.info,
        ),
        (
            "Sound",
            sound_label(app).to_string(),
            theme.info,
        ),
    ];

    for (i, (label, value, color)) in rows.iter().enumerate() {
        execute!(stdout, MoveTo(x, y + i as u16 * 2), SetBackgroundColor(theme.bg))?;
        if !label.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(theme.info),
                Print(format!("{:<7}", label))
            )?;
        }
        execute!(stdout, SetForegroundColor(*color), Print(value))?;
    }

    let status = app.leaderboard.status();
    let mut backend = if status.using_fallback {
        format!("Scores: {} (fallback)", status.backend_name)
    } else {
        format!("Scores: {}", status.backend_name)
    };
    if app.leaderboard.is_busy() {
        backend.push_str(" ...");
    }
    execute!(
        stdout,
        MoveTo(x, y + 13),
        SetForegroundColor(theme.info),
        Print(backend)
    )?;

    if app.session.screen() == Screen::Paused {
        execute!(
            stdout,
            MoveTo(x, y + 15),
            SetForegroundColor(theme.key),
            Print("PAUSED")
        )?;
    }
    Ok(())
}

fn timer_color(app: &App) -> Color {
    match app.session.game() {
        Some(g) if g.tier.is_timed() && g.remaining_secs <= 10 => app.theme.error,
        _ => app.theme.fg,
    }
}

fn sound_label(app: &App) -> &'static str {
    match (app.session.sound_on(), app.view.music_playing()) {
        (true, true) => "on ♪",
        (true, false) => "on",
        (false, _) => "off",
    }
}

fn render_controls(stdout: &mut io::Stdout, app: &App, x: u16, y: u16) -> io::Result<()> {
    let controls = [
        ("hjkl/Arrows", "Move"),
        ("Space", "Lift/Drop"),
        ("Mouse", "Drag"),
        ("Esc", "Put back"),
        ("?", "Hint"),
        ("s", "Shuffle"),
        ("^R", "Restart"),
        ("d", "Difficulty"),
        ("g", "Gallery"),
        ("b", "Leaderboard"),
        ("m", "Sound"),
        ("q", "Quit"),
    ];
    render_key_rows(stdout, app, &controls, x, y, 4)
}

/// Key help laid out in columns of `per_column` entries
fn render_key_rows(
    stdout: &mut io::Stdout,
    app: &App,
    controls: &[(&str, &str)],
    x: u16,
    y: u16,
    per_column: usize,
) -> io::Result<()> {
    let theme = &app.theme;
    execute!(stdout, SetBackgroundColor(theme.bg))?;
    for (i, (key, desc)) in controls.iter().enumerate() {
        let col = i / per_column;
        let row = i % per_column;
        execute!(
            stdout,
            MoveTo(x + col as u16 * 24, y + row as u16),
            SetForegroundColor(theme.key),
            Print(format!("{:>11}", key)),
            SetForegroundColor(theme.info),
            Print(format!(" {}", desc))
        )?;
    }
    Ok(())
}

fn render_message(stdout: &mut io::Stdout, app: &App, msg: &str, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    let padded = format!("  {}  ", msg);
    let x = term_width.saturating_sub(padded.chars().count() as u16) / 2;

    execute!(
        stdout,
        MoveTo(x, 0),
        SetForegroundColor(theme.fg),
        SetBackgroundColor(theme.lifted_bg),
        Print(&padded)
    )?;

    Ok(())
}

/// Blank box centred on the screen; returns its top-left corner
fn draw_modal_box(
    stdout: &mut io::Stdout,
    app: &App,
    title: &str,
    width: u16,
    height: u16,
    term_width: u16,
    term_height: u16,
) -> io::Result<(u16, u16)> {
    let theme = &app.theme;
    let x = term_width.saturating_sub(width) / 2;
    let y = term_height.saturating_sub(height) / 2;

    for row in 0..height {
        execute!(
            stdout,
            MoveTo(x, y + row),
            SetBackgroundColor(theme.modal_bg),
            Print(" ".repeat(width as usize))
        )?;
    }
    let title_x = x + width.saturating_sub(title.chars().count() as u16) / 2;
    execute!(
        stdout,
        MoveTo(title_x, y + 1),
        SetForegroundColor(theme.key),
        Print(title)
    )?;
    Ok((x, y))
}

fn render_difficulty_menu(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    let options = app.difficulty_options();
    let height = options.len() as u16 + 7;
    let (x, y) = draw_modal_box(stdout, app, "Select Difficulty", 34, height, term_width, term_height)?;

    for (i, &size) in options.iter().enumerate() {
        let tier = app.session.config().difficulties.tier(size);
        let clock = if tier.is_timed() {
            format_time(tier.time_budget_secs)
        } else {
            "untimed".to_string()
        };
        let selected = i == app.difficulty_selection;
        let (marker, color) = if selected {
            ("▶", theme.key)
        } else {
            (" ", theme.fg)
        };
        execute!(
            stdout,
            MoveTo(x + 3, y + 3 + i as u16),
            SetForegroundColor(color),
            Print(format!("{} {:>2} × {:<2}   {}", marker, size, size, clock))
        )?;
    }

    let back = if app.session.screen() == Screen::Paused {
        "Esc: resume"
    } else {
        "Esc: back"
    };
    execute!(
        stdout,
        MoveTo(x + 3, y + height - 2),
        SetForegroundColor(theme.info),
        Print(format!("2-9: any size  {}", back))
    )?;
    Ok(())
}

fn render_victory(stdout: &mut io::Stdout, app: &App, term_width: u16, term_height: u16) -> io::Result<()> {
    let theme = &app.theme;
    let Some(victory) = app.view.victory.as_ref() else {
        return Ok(());
    };
    let (x, y) = draw_modal_box(stdout, app, "Puzzle Solved!", 40, 12, term_width, term_height)?;

    let lines = [
        format!("Time taken: {}", victory.time_string()),
        format!("Moves:      {}", victory.moves),
        format!("Score:      {}", victory.score),
        format!("Status:     {}", victory.status.label()),
    ];
    execute!(stdout, SetForegroundColor(theme.fg))?;
    for (i, line) in lines.iter().enumerate() {
        execute!(stdout, MoveTo(x + 3, y + 3 + i as u16), Print(line))?;
    }

    let prompt_y = y + 9;
    if app.entering_name {
        execute!(
            stdout,
            MoveTo(x + 3, prompt_y),
            SetForegroundColor(theme.key),
            Print(format!("Nickname: {}_", app.nickname))
        )?;
    } else if app.view.submit_enabled {
        execute!(
            stdout,
            MoveTo(x + 3, prompt_y),
            SetForegroundColor(theme.info),
            Print("Enter: submit  d: new  g: gallery")
        )?;
    } else {
        execute!(
            stdout,
            MoveTo(x + 3, prompt_y),
            SetForegroundColor(theme.info),
            Print("d: new  r: again  g: gallery")
        )?;
    }
    Ok(())
}

fn render_game_over(stdout: &mut io::Stdout, app: &App, term_width: u16, term_height: u16) -> io::Result<()> {
    let theme = &app.theme;
    let (x, y) = draw_modal_box(stdout, app, "Game Over", 36, 7, term_width, term_height)?;
    execute!(
        stdout,
        MoveTo(x + 3, y + 3),
        SetForegroundColor(theme.error),
        Print("Time's up! Back to the gallery..."),
        MoveTo(x + 3, y + 5),
        SetForegroundColor(theme.info),
        Print("r: try again  d: difficulty")
    )?;
    Ok(())
}

fn render_leaderboard(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    let empty = LeaderboardView::Empty;
    let view = app.view.leaderboard.as_ref().unwrap_or(&empty);
    let shown = view.entries().len().min(term_height.saturating_sub(10) as usize);
    let height = shown.max(1) as u16 + 7;
    let width = 76.min(term_width);
    let (x, y) = draw_modal_box(stdout, app, "═══ LEADERBOARD ═══", width, height, term_width, term_height)?;

    if view.is_empty() {
        execute!(
            stdout,
            MoveTo(x + 3, y + 3),
            SetForegroundColor(theme.info),
            Print("No scores registered yet.")
        )?;
    } else {
        execute!(
            stdout,
            MoveTo(x + 2, y + 3),
            SetForegroundColor(theme.info),
            Print(leaderboard_row("Rank", "Nickname", "Score", "Status", "Size", "Time", "Date"))
        )?;
        for (i, entry) in view.entries().iter().take(shown).enumerate() {
            let r = &entry.record;
            let color = if i == 0 { theme.success } else { theme.fg };
            execute!(
                stdout,
                MoveTo(x + 2, y + 4 + i as u16),
                SetForegroundColor(color),
                Print(leaderboard_row(
                    &entry.rank.to_string(),
                    &r.nickname,
                    &r.score.to_string(),
                    &r.emotion,
                    &r.difficulty,
                    &r.time,
                    &r.date,
                ))
            )?;
        }
    }

    execute!(
        stdout,
        MoveTo(x + 3, y + height - 2),
        SetForegroundColor(theme.info),
        Print("Esc: close")
    )?;
    Ok(())
}

fn leaderboard_row(
    rank: &str,
    nickname: &str,
    score: &str,
    status: &str,
    size: &str,
    time: &str,
    date: &str,
) -> String {
    format!(
        "{:>4}  {:<14} {:>5}  {:<16} {:<5} {:>5}  {}",
        rank,
        truncate(nickname, 14),
        score,
        truncate(status, 16),
        size,
        time,
        date
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 14), "short");
        assert_eq!(truncate("averyveryverylongname", 6), "avery…");
    }

    #[test]
    fn test_leaderboard_row_columns() {
        let row = leaderboard_row("1", "ada", "92", "great", "4x4", "00:31", "2026-10-19");
        assert!(row.starts_with("   1  ada"));
        assert!(row.ends_with("00:31  2026-10-19"));
    }
}
