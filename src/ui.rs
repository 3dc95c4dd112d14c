//! Layout and drawing: title, playfield, sidebar, notices, pause, game over.

use crate::app::{Notice, Screen};
use crate::board::{COLS, Piece, ROWS, Shape};
use crate::challenge::ChallengeKind;
use crate::game::{Game, LineClear};
use crate::level::LINES_PER_LEVEL;
use crate::powerup::{MAX_INVENTORY, WEIGHTS};
use crate::theme::{Theme, parse_hex};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per grid cell; two keeps blocks roughly square.
const CELL_WIDTH: u16 = 2;
/// Bordered playfield size in terminal cells.
const PLAYFIELD_W: u16 = COLS as u16 * CELL_WIDTH + 2;
const PLAYFIELD_H: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_HEIGHT: u16 = PLAYFIELD_H + 3;
/// Spare columns on each side of the playfield for the wobble.
const WOBBLE_MARGIN: u16 = 1;

/// Fade applied to completed rows while they flash.
const LINE_CLEAR_FADE_MS: u32 = 100;
/// Time for a shockwave ring to grow by one cell.
const SHOCKWAVE_STEP_MS: u128 = 60;
const SHOCKWAVE_RINGS: u128 = 4;
/// Notices shown at once, newest last.
const MAX_NOTICES: usize = 3;

#[derive(Debug, Clone, Copy)]
struct Shockwave {
    x: i32,
    y: i32,
    started: Instant,
}

/// Frontend-only effect state carried between frames.
#[derive(Default)]
pub struct FxState {
    line_clear: Option<Effect>,
    line_clear_process_time: Option<Instant>,
    shockwaves: Vec<Shockwave>,
    /// Grid area of the last drawn frame; mouse clicks are mapped against it.
    pub board_rect: Rect,
}

impl FxState {
    pub fn shockwave(&mut self, x: i32, y: i32, now: Instant) {
        self.shockwaves.push(Shockwave { x, y, started: now });
    }

    pub fn reset(&mut self) {
        self.line_clear = None;
        self.line_clear_process_time = None;
        self.shockwaves.clear();
    }
}

/// Everything a frame needs besides the effect state.
pub struct View<'a> {
    pub game: &'a Game,
    pub theme: &'a Theme,
    pub screen: Screen,
    pub paused: bool,
    pub notices: &'a [Notice],
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLayout {
    /// Bordered playfield.
    pub playfield: Rect,
    /// Grid cells only.
    pub board: Rect,
    pub sidebar: Rect,
}

/// Centre playfield and sidebar in `area`; `wobble` nudges the playfield sideways.
pub fn game_layout(area: Rect, wobble: i16) -> GameLayout {
    let total_w = PLAYFIELD_W + 2 * WOBBLE_MARGIN + SIDEBAR_WIDTH;
    let x0 = area.x + area.width.saturating_sub(total_w) / 2;
    let y0 = area.y + area.height.saturating_sub(SIDEBAR_HEIGHT) / 2;
    let px = (i32::from(x0 + WOBBLE_MARGIN) + i32::from(wobble)).max(0) as u16;
    let playfield = Rect::new(px, y0, PLAYFIELD_W, PLAYFIELD_H).intersection(area);
    let board = playfield.inner(Margin::new(1, 1));
    let sidebar = Rect::new(
        x0 + PLAYFIELD_W + 2 * WOBBLE_MARGIN,
        y0,
        SIDEBAR_WIDTH,
        SIDEBAR_HEIGHT,
    )
    .intersection(area);
    GameLayout {
        playfield,
        board,
        sidebar,
    }
}

/// Grid cell under a terminal position. May be off the grid.
pub fn cell_at(board: Rect, column: u16, row: u16) -> (i32, i32) {
    let dx = i32::from(column) - i32::from(board.x);
    let dy = i32::from(row) - i32::from(board.y);
    (dx.div_euclid(i32::from(CELL_WIDTH)), dy)
}

/// Sideways shake while the wobble challenge runs, driven by the game clock.
fn wobble_offset(game: &Game) -> i16 {
    if !game.challenges().is_active(ChallengeKind::WobbleScreen) {
        return 0;
    }
    match (game.clock_ms() / 90) % 4 {
        1 => 1,
        3 => -1,
        _ => 0,
    }
}

pub fn draw(frame: &mut Frame, view: &View, fx: &mut FxState, now: Instant) {
    let area = frame.area();
    let bg = Block::default().style(Style::default().bg(view.theme.bg));
    frame.render_widget(bg, area);

    match view.screen {
        Screen::Title => draw_title(frame, view, area),
        Screen::Playing | Screen::GameOver => {
            let layout = game_layout(area, wobble_offset(view.game));
            fx.board_rect = layout.board;
            draw_playfield(frame, view, &layout, fx, now);
            draw_sidebar(frame, view, layout.sidebar);
            draw_notices(frame, view, layout.playfield);
            if view.screen == Screen::GameOver {
                draw_game_over(frame, view, area);
            } else if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
        }
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn popup_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
}

fn draw_title(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let level = view.game.level();
    let fg = Style::default().fg(theme.main_fg);
    let key = Style::default().fg(theme.title);
    let controls: [(&str, &str); 9] = [
        ("←/→ h/l", "move"),
        ("↑ k", "rotate"),
        ("↓ j", "soft drop"),
        ("space", "hard drop"),
        ("c", "hold"),
        ("s / tab", "shift shape"),
        ("1-4", "use powerup"),
        ("click", "detonate bomb"),
        ("p / q", "pause / quit"),
    ];
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " SURGETRIS ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Saved: level {}  ({}/{} lines)",
                level.level(),
                level.progress(),
                LINES_PER_LEVEL
            ),
            fg,
        )),
        Line::from(""),
    ];
    lines.extend(controls.iter().map(|(k, what)| {
        Line::from(vec![
            Span::styled(format!("{k:>9} "), key),
            Span::styled(format!("{what:<14}"), fg),
        ])
    }));
    lines.push(Line::from(""));
    lines.extend(WEIGHTS.iter().map(|(kind, _)| {
        let color = parse_hex(kind.color_hex()).unwrap_or(theme.main_fg);
        Line::from(vec![
            Span::styled(format!("[{}] ", kind.glyph()), Style::default().fg(color)),
            Span::styled(kind.description(), fg),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Enter — Continue    N — New game ",
        fg.add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(" Q — Quit ", fg)));
    let popup = centered(area, 40, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(popup_block(theme)),
        popup,
    );
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(popup_block(theme)),
        popup,
    );
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let game = view.game;
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " GAME OVER ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", game.score()), fg)),
        Line::from(Span::styled(
            format!(" Lines: {} ", game.lines_cleared()),
            fg,
        )),
        Line::from(Span::styled(
            format!(" Level: {} ", game.level().level()),
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled(" R — Restart    Q — Quit ", fg)),
        Line::from(""),
    ];
    let popup = centered(area, 30, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(popup_block(theme).title(Span::styled(" Surgetris ", theme.title))),
        popup,
    );
}

/// Scale an RGB colour; named colours are mapped to RGB first.
fn shade(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    };
    let scale = |c: u8| (f32::from(c) * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

/// Mix `color` toward `target` by `t` in 0..=1.
fn blend(color: Color, target: Color, t: f32) -> Color {
    match (shade(color, 1.0), shade(target, 1.0)) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t) as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => color,
    }
}

/// Write one grid cell (two terminal columns) if it is inside `board`.
fn put_cell(buf: &mut Buffer, board: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    if x < 0 || y < 0 {
        return;
    }
    let rx = board.x + x as u16 * CELL_WIDTH;
    let ry = board.y + y as u16;
    for col in rx..rx + CELL_WIDTH {
        let pos = Position::new(col, ry);
        if board.contains(pos) {
            buf[pos].set_symbol(symbol).set_style(style);
        }
    }
}

fn cheap_hash(x: i32, y: i32, t: u64) -> u64 {
    (x as u64).wrapping_mul(73_856_093)
        ^ (y as u64).wrapping_mul(19_349_663)
        ^ t.wrapping_mul(83_492_791)
}

fn draw_playfield(
    frame: &mut Frame,
    view: &View,
    layout: &GameLayout,
    fx: &mut FxState,
    now: Instant,
) {
    let theme = view.theme;
    let game = view.game;
    let rules = game.rules();
    let board_rect = layout.board;

    let (title, border) = if rules.bomb_armed {
        (" BOMB ARMED: click a block ".to_string(), Color::from_u32(0xFF4500))
    } else if let Some(active) = game.challenges().active() {
        (format!(" {} ", active.kind.label()), theme.title)
    } else {
        (
            format!(" Surgetris  | Level {} ", game.level().level()),
            theme.div_line,
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    frame.render_widget(block, layout.playfield);

    let (flash_rows, flash_on) = match game.line_clear() {
        LineClear::Pending { rows, frame: step } => (rows.as_slice(), step % 2 == 0),
        LineClear::Idle => (&[][..], false),
    };

    let buf = frame.buffer_mut();
    let board = game.board();
    for y in 0..ROWS {
        let flashing = flash_rows.contains(&y);
        for x in 0..COLS {
            let (symbol, style) = match board.get(x, y) {
                Some(v) if v != 0 => {
                    let color = if flashing && flash_on {
                        theme.flash
                    } else {
                        theme.block_color(v)
                    };
                    ("█", Style::default().fg(color).bg(theme.bg))
                }
                _ => (" ", Style::default().bg(theme.bg)),
            };
            put_cell(buf, board_rect, x as i32, y as i32, symbol, style);
        }
    }

    if let Some(piece) = game.piece() {
        if let Some(row) = game.ghost_row() {
            let landing = Piece {
                y: row,
                ..piece.clone()
            };
            for (x, y, v) in landing.cells() {
                let ux = x as usize;
                let uy = y as usize;
                if y >= 0 && board.get(ux, uy) == Some(0) {
                    let style = Style::default()
                        .fg(shade(theme.block_color(v), 0.45))
                        .bg(theme.bg);
                    put_cell(buf, board_rect, x, y, "░", style);
                }
            }
        }
        let symbol = if rules.ghost_active() { "▒" } else { "█" };
        for (x, y, v) in piece.cells() {
            let style = Style::default().fg(theme.block_color(v)).bg(theme.bg);
            put_cell(buf, board_rect, x, y, symbol, style);
        }
    }

    if !view.no_animation {
        draw_shockwaves(buf, board_rect, theme, &mut fx.shockwaves, now);
        if game.challenges().is_active(ChallengeKind::Glitch) {
            draw_glitch(buf, board_rect, game.clock_ms());
        }
    }

    if view.no_animation || flash_rows.is_empty() {
        fx.line_clear = None;
        fx.line_clear_process_time = None;
    } else {
        apply_line_clear_effect(frame, theme, board_rect, flash_rows, fx, now);
    }
}

/// Expanding square rings around each landing point, fading as they grow.
fn draw_shockwaves(
    buf: &mut Buffer,
    board: Rect,
    theme: &Theme,
    waves: &mut Vec<Shockwave>,
    now: Instant,
) {
    let step_of = |w: &Shockwave| now.saturating_duration_since(w.started).as_millis() / SHOCKWAVE_STEP_MS;
    waves.retain(|w| step_of(w) < SHOCKWAVE_RINGS);
    for wave in waves.iter() {
        let step = step_of(wave);
        let radius = step as i32 + 1;
        let strength = 0.7 * (1.0 - step as f32 / SHOCKWAVE_RINGS as f32);
        for y in wave.y - radius..=wave.y + radius {
            for x in wave.x - radius..=wave.x + radius {
                let ring = (x - wave.x).abs().max((y - wave.y).abs()) == radius;
                if !ring || x < 0 || y < 0 || x >= COLS as i32 || y >= ROWS as i32 {
                    continue;
                }
                let pos = Position::new(board.x + x as u16 * CELL_WIDTH, board.y + y as u16);
                if !board.contains(pos) {
                    continue;
                }
                let cell = &buf[pos];
                let fg = blend(cell.fg, theme.flash, strength);
                let bg = blend(cell.bg, theme.flash, strength * 0.5);
                let symbol = cell.symbol().to_string();
                put_cell(buf, board, x, y, &symbol, Style::default().fg(fg).bg(bg));
            }
        }
    }
}

/// Scattered tinted cells that reshuffle every few frames.
fn draw_glitch(buf: &mut Buffer, board: Rect, clock_ms: u64) {
    let t = clock_ms / 80;
    for y in 0..ROWS as i32 {
        for x in 0..COLS as i32 {
            let h = cheap_hash(x, y, t);
            if h % 13 != 0 {
                continue;
            }
            let color = if h % 2 == 0 { Color::Magenta } else { Color::Cyan };
            put_cell(buf, board, x, y, "▒", Style::default().fg(color));
        }
    }
}

/// Create or advance the fade over flashing rows (TachyonFX).
fn apply_line_clear_effect(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    rows: &[usize],
    fx: &mut FxState,
    now: Instant,
) {
    let delta = fx
        .line_clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or_default();
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    fx.line_clear_process_time = Some(now);

    let effect = fx.line_clear.get_or_insert_with(|| {
        let rows: HashSet<u16> = rows.iter().map(|&y| board_rect.y + y as u16).collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| rows.contains(&pos.y)));
        fx::fade_to(theme.bg, theme.bg, (LINE_CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect)
    });
    frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
}

fn draw_notices(frame: &mut Frame, view: &View, playfield: Rect) {
    let start = view.notices.len().saturating_sub(MAX_NOTICES);
    let style = Style::default()
        .fg(view.theme.title)
        .bg(view.theme.bg)
        .add_modifier(Modifier::BOLD);
    for (i, notice) in view.notices[start..].iter().enumerate() {
        let width = (notice.text.chars().count() as u16 + 2).min(playfield.width);
        let rect = Rect {
            x: playfield.x + playfield.width.saturating_sub(width) / 2,
            y: playfield.y + 2 + i as u16,
            width,
            height: 1,
        }
        .intersection(playfield);
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(Span::styled(notice.text.as_str(), style)).alignment(Alignment::Center),
            rect,
        );
    }
}

fn section<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let game = view.game;
    let rules = game.rules();
    let fg = Style::default().fg(theme.main_fg);
    let key = Style::default().fg(theme.title);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next | Hold
            Constraint::Length(6), // Stats
            Constraint::Length(3), // Level progress
            Constraint::Length(MAX_INVENTORY as u16 + 2),
            Constraint::Min(3), // Effects
        ])
        .split(area);

    let previews = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);
    let next_block = section(theme, " Next ");
    let next_inner = next_block.inner(previews[0]);
    frame.render_widget(next_block, previews[0]);
    match game.preview() {
        Some(shape) => draw_shape(frame.buffer_mut(), theme, next_inner, shape, false),
        None => frame.render_widget(
            Paragraph::new(Span::styled("???", Style::default().fg(theme.inactive_fg)))
                .alignment(Alignment::Center),
            next_inner,
        ),
    }
    let hold_block = section(theme, " Hold ");
    let hold_inner = hold_block.inner(previews[1]);
    frame.render_widget(hold_block, previews[1]);
    if let Some(shape) = game.held() {
        draw_shape(frame.buffer_mut(), theme, hold_inner, shape, !rules.hold_allowed);
    }

    let stat = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(name, key), Span::styled(value, fg)])
    };
    let stats = vec![
        stat("Score:  ", game.score().to_string()),
        stat(
            "Lines:  ",
            format!("{}  combo {}", game.lines_cleared(), game.combo()),
        ),
        stat("Shifts: ", rules.shift_chances.to_string()),
        stat(
            "Next powerup: ",
            game.powerups().next_score_threshold().to_string(),
        ),
    ];
    let stats_block = section(theme, " Stats ");
    let stats_inner = stats_block.inner(chunks[1]);
    frame.render_widget(stats_block, chunks[1]);
    frame.render_widget(Paragraph::new(stats), stats_inner);

    let level = game.level();
    let level_block = section(theme, " Level ");
    let level_inner = level_block.inner(chunks[2]);
    frame.render_widget(level_block, chunks[2]);
    let gauge = Gauge::default()
        .ratio(f64::from(level.progress()) / f64::from(LINES_PER_LEVEL))
        .label(format!(
            "{}  {}/{}",
            level.level(),
            level.progress(),
            LINES_PER_LEVEL
        ))
        .gauge_style(Style::default().fg(theme.block_color(5)).bg(theme.div_line));
    frame.render_widget(gauge, level_inner);

    let inventory = game.powerups().inventory();
    let slots: Vec<Line> = (0..MAX_INVENTORY)
        .map(|slot| match inventory.get(slot) {
            Some(kind) => {
                let color = parse_hex(kind.color_hex()).unwrap_or(theme.main_fg);
                Line::from(vec![
                    Span::styled(format!("{} ", slot + 1), key),
                    Span::styled(
                        format!("[{}] ", kind.glyph()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(kind.name(), fg),
                ])
            }
            None => Line::from(Span::styled(
                format!("{} [ ]", slot + 1),
                Style::default().fg(theme.inactive_fg),
            )),
        })
        .collect();
    let inv_block = section(theme, " Powerups ");
    let inv_inner = inv_block.inner(chunks[3]);
    frame.render_widget(inv_block, chunks[3]);
    frame.render_widget(Paragraph::new(slots), inv_inner);

    draw_effects(frame, view, chunks[4]);
}

/// Active challenge countdown plus any running powerup effects.
fn draw_effects(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let game = view.game;
    let rules = game.rules();
    let block = section(theme, " Effects ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if rules.slow_time_active() {
        lines.push(Line::from(Span::styled(
            format!("Slow time {}s", rules.slow_time_ms.div_ceil(1000)),
            Style::default().fg(Color::from_u32(0x00CED1)),
        )));
    }
    if rules.ghost_active() {
        lines.push(Line::from(Span::styled(
            format!("Ghost x{}", rules.ghost_uses),
            Style::default().fg(Color::from_u32(0x9370DB)),
        )));
    }
    if rules.bomb_armed {
        lines.push(Line::from(Span::styled(
            "Bomb armed",
            Style::default().fg(Color::from_u32(0xFF4500)),
        )));
    }

    let Some(active) = game.challenges().active() else {
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "none",
                Style::default().fg(theme.inactive_fg),
            )));
        }
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    let ratio = active.remaining_ratio(game.clock_ms());
    let secs = active.deadline_ms.saturating_sub(game.clock_ms()).div_ceil(1000);
    let bar_color = if ratio > 0.6 {
        Color::Green
    } else if ratio > 0.3 {
        Color::Yellow
    } else {
        Color::Red
    };
    frame.render_widget(
        Gauge::default()
            .ratio(ratio)
            .label(format!("{} {secs}s", active.kind.label()))
            .gauge_style(Style::default().fg(bar_color).bg(theme.div_line)),
        parts[0],
    );
    frame.render_widget(Paragraph::new(lines), parts[1]);
}

/// Draw a shape centred in `area`, dimmed when `muted`.
fn draw_shape(buf: &mut Buffer, theme: &Theme, area: Rect, shape: &Shape, muted: bool) {
    let w = shape.width() as u16 * CELL_WIDTH;
    let h = shape.height() as u16;
    let origin = Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    for (dx, dy, v) in shape.filled() {
        let color = theme.block_color(v);
        let color = if muted { shade(color, 0.4) } else { color };
        put_cell(buf, origin, dx, dy, "█", Style::default().fg(color).bg(theme.bg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered_text(view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let mut fx = FxState::default();
        terminal
            .draw(|f| draw(f, view, &mut fx, Instant::now()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn clicks_map_to_cells() {
        let board = Rect::new(10, 5, 20, 20);
        assert_eq!(cell_at(board, 10, 5), (0, 0));
        assert_eq!(cell_at(board, 11, 5), (0, 0));
        assert_eq!(cell_at(board, 12, 24), (1, 19));
        assert_eq!(cell_at(board, 9, 4), (-1, -1));
        assert_eq!(cell_at(board, 30, 5), (10, 0));
    }

    #[test]
    fn layout_fits_grid() {
        let layout = game_layout(Rect::new(0, 0, 80, 30), 0);
        assert_eq!(layout.board.width, COLS as u16 * CELL_WIDTH);
        assert_eq!(layout.board.height, ROWS as u16);
        assert!(layout.sidebar.x >= layout.playfield.right());
    }

    #[test]
    fn playing_screen_shows_stats() {
        let game = Game::new(Box::new(MemoryStore::default()), 1);
        let theme = Theme::default();
        let notices = [Notice {
            text: "Hello".into(),
            expires: Instant::now(),
        }];
        let text = rendered_text(&View {
            game: &game,
            theme: &theme,
            screen: Screen::Playing,
            paused: false,
            notices: &notices,
            no_animation: false,
        });
        assert!(text.contains("Score"));
        assert!(text.contains("Powerups"));
        assert!(text.contains("Hello"));
    }

    #[test]
    fn title_shows_saved_level() {
        let game = Game::new(Box::new(MemoryStore::default()), 1);
        let theme = Theme::default();
        let text = rendered_text(&View {
            game: &game,
            theme: &theme,
            screen: Screen::Title,
            paused: false,
            notices: &[],
            no_animation: true,
        });
        assert!(text.contains("Saved: level 1"));
    }
}
