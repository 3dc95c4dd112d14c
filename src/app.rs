//! App: terminal init, main loop, cue handling, key and mouse dispatch.

use crate::GameConfig;
use crate::feedback::Cue;
use crate::game::Game;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, FxState, View};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest simulated step per frame; a stalled terminal must not fast-forward timers.
const MAX_FRAME_DELTA_MS: u128 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Title,
    Playing,
    GameOver,
}

/// Transient message over the playfield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub expires: Instant,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: Game,
    screen: Screen,
    paused: bool,
    notices: Vec<Notice>,
    fx: FxState,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, game: Game) -> Self {
        Self {
            config,
            theme,
            game,
            screen: Screen::Title,
            paused: false,
            notices: Vec::new(),
            fx: FxState::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        let mut last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let delta = now.duration_since(last_frame).as_millis().min(MAX_FRAME_DELTA_MS) as u32;
            last_frame = now;

            if self.screen == Screen::Playing && !self.paused {
                self.game.tick(delta);
                if self.game.is_game_over() {
                    info!(score = self.game.score(), "game over");
                    self.screen = Screen::GameOver;
                }
            }
            self.handle_cues(now);
            self.notices.retain(|n| n.expires > now);

            terminal.draw(|f| {
                let view = View {
                    game: &self.game,
                    theme: &self.theme,
                    screen: self.screen,
                    paused: self.paused,
                    notices: &self.notices,
                    no_animation: self.config.no_animation,
                };
                ui::draw(f, &view, &mut self.fx, now);
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let quit = match event::read()? {
                        Event::Key(key) => self.handle_key(key),
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse);
                            false
                        }
                        _ => false,
                    };
                    if quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Drain the game's outbox. Sounds have no backend; they are logged.
    fn handle_cues(&mut self, now: Instant) {
        for cue in self.game.drain_cues() {
            match cue {
                Cue::Sound(sfx) => debug!(?sfx, "sound"),
                Cue::Notice { text, duration } => self.notices.push(Notice {
                    text,
                    expires: now + duration,
                }),
                Cue::Shockwave { x, y } => {
                    if !self.config.no_animation {
                        self.fx.shockwave(x, y, now);
                    }
                }
            }
        }
    }

    fn start_new_game(&mut self) {
        self.game.new_game();
        self.notices.clear();
        self.fx.reset();
        self.paused = false;
        self.screen = Screen::Playing;
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let action = key_to_action(key);
        match self.screen {
            Screen::Title => match (action, key.code) {
                (Action::Quit, _) => return true,
                (Action::HardDrop, KeyCode::Enter) => {
                    info!(level = self.game.level().level(), "continuing saved level");
                    self.screen = Screen::Playing;
                }
                (_, KeyCode::Char('n')) => self.start_new_game(),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return true,
                Action::Restart | Action::HardDrop => self.start_new_game(),
                _ => {}
            },
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => return true,
                Action::Restart => self.start_new_game(),
                _ => {}
            },
            Screen::Playing => self.apply_action(action),
        }
        false
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.game.move_piece(-1),
            Action::MoveRight => self.game.move_piece(1),
            Action::Rotate => self.game.rotate(),
            Action::SoftDrop => self.game.soft_drop(),
            Action::HardDrop => self.game.hard_drop(),
            Action::Hold => self.game.hold(),
            Action::Shift => self.game.shift_shape(),
            Action::UsePowerup(slot) => self.game.use_powerup(slot),
            Action::Pause => self.paused = true,
            Action::Restart => self.start_new_game(),
            // Quit from play goes through the pause screen first.
            Action::Quit => self.paused = true,
            Action::None => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let (x, y) = ui::cell_at(self.fx.board_rect, mouse.column, mouse.row);
            if self.game.bomb_click(x, y) {
                debug!(x, y, "bomb detonated");
            }
        }
    }
}
