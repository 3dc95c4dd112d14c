//! Game state: board, current piece, line clear, powerups, challenges, clock.

use crate::board::{Board, COLS, Piece, ROWS, Shape};
use crate::challenge::Challenges;
use crate::feedback::{Cue, Feedback, Sfx};
use crate::level::LevelTracker;
use crate::powerup::{PowerupKind, Powerups};
use crate::progress::ProgressStore;
use crate::rules::{GHOST_USES, Rules};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Ticks a completed row flashes before it is removed.
pub const CLEAR_FRAMES: u8 = 6;
const LINE_SCORE: u32 = 100;
const AUTO_CLEAR_SCORE: u32 = 200;
const BOMB_CELL_SCORE: u32 = 50;
/// Horizontal offsets tried, in order, when a shifted shape does not fit.
const SHIFT_OFFSETS: [i32; 6] = [1, -1, 2, -2, 3, -3];

/// Line-clear pipeline. While `Pending` there is no current piece.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LineClear {
    #[default]
    Idle,
    /// `rows` flash for `CLEAR_FRAMES` ticks; `frame` counts ticks since entry.
    Pending { rows: Vec<usize>, frame: u8 },
}

#[derive(Debug)]
pub struct Game {
    board: Board,
    piece: Option<Piece>,
    next: Shape,
    held: Option<Shape>,
    rules: Rules,
    score: u32,
    lines_cleared: u32,
    combo: u32,
    level: LevelTracker,
    powerups: Powerups,
    challenges: Challenges,
    line_clear: LineClear,
    game_over: bool,
    /// Simulated milliseconds since the game started; frozen while paused.
    clock_ms: u64,
    drop_counter_ms: u32,
    rng: StdRng,
    feedback: Feedback,
}

impl Game {
    /// Load saved progress from `store` and spawn the first piece.
    pub fn new(store: Box<dyn ProgressStore>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let level = LevelTracker::load(store);
        let next = Shape::random(&mut rng);
        let challenges = Challenges::new(&mut rng);
        let mut game = Self {
            board: Board::new(),
            piece: None,
            next,
            held: None,
            rules: Rules::new(level.level()),
            score: 0,
            lines_cleared: 0,
            combo: 0,
            level,
            powerups: Powerups::default(),
            challenges,
            line_clear: LineClear::Idle,
            game_over: false,
            clock_ms: 0,
            drop_counter_ms: 0,
            rng,
            feedback: Feedback::default(),
        };
        game.spawn();
        game
    }

    /// Start over: empty board, level 1, every effect and pool reset.
    pub fn new_game(&mut self) {
        self.board = Board::new();
        self.held = None;
        self.score = 0;
        self.lines_cleared = 0;
        self.combo = 0;
        self.level.reset();
        self.rules = Rules::new(self.level.level());
        self.powerups = Powerups::default();
        self.challenges = Challenges::new(&mut self.rng);
        self.line_clear = LineClear::Idle;
        self.game_over = false;
        self.clock_ms = 0;
        self.drop_counter_ms = 0;
        self.feedback.clear();
        self.next = Shape::random(&mut self.rng);
        info!("new game");
        self.spawn();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    /// Next shape, or None while the preview is hidden.
    pub fn preview(&self) -> Option<&Shape> {
        self.rules.preview_visible.then_some(&self.next)
    }

    pub fn held(&self) -> Option<&Shape> {
        self.held.as_ref()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn level(&self) -> &LevelTracker {
        &self.level
    }

    pub fn powerups(&self) -> &Powerups {
        &self.powerups
    }

    pub fn challenges(&self) -> &Challenges {
        &self.challenges
    }

    pub fn line_clear(&self) -> &LineClear {
        &self.line_clear
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Row the current piece would land on under the active collision rule.
    pub fn ghost_row(&self) -> Option<i32> {
        let piece = self.piece.as_ref()?;
        Some(self.board.landing_row(piece, self.rules.ghost_active()))
    }

    /// Hand every queued cue to the frontend.
    pub fn drain_cues(&mut self) -> impl Iterator<Item = Cue> + '_ {
        self.feedback.drain()
    }

    /// Advance the simulation by `delta_ms`: effect expiry first, then the
    /// line clear or gravity, then powerup grants.
    pub fn tick(&mut self, delta_ms: u32) {
        if self.game_over {
            return;
        }
        self.clock_ms += u64::from(delta_ms);

        if self.rules.tick_slow_time(delta_ms) {
            self.feedback.notify("Speed restored", 1500);
        }
        if let Some(kind) =
            self.challenges
                .update(self.clock_ms, &mut self.rules, self.level.level())
        {
            self.feedback
                .notify(format!("{} challenge complete!", kind.label()), 1500);
        }

        if matches!(self.line_clear, LineClear::Pending { .. }) {
            self.advance_line_clear();
        } else {
            self.gravity(delta_ms);
        }
        if self.game_over {
            return;
        }

        self.powerups.check_triggers(
            self.score,
            self.combo,
            self.clock_ms,
            &mut self.rng,
            &mut self.feedback,
        );
    }

    fn gravity(&mut self, delta_ms: u32) {
        if self.piece.is_none() {
            return;
        }
        self.drop_counter_ms = self.drop_counter_ms.saturating_add(delta_ms);
        if self.drop_counter_ms > self.rules.drop_interval_ms {
            self.drop_counter_ms = 0;
            self.step_down();
        }
    }

    /// Move the piece one row down, locking it if it cannot go further.
    fn step_down(&mut self) -> bool {
        let ghost = self.rules.ghost_active();
        let Some(piece) = self.piece.as_mut() else {
            return false;
        };
        piece.y += 1;
        if self.board.collides(piece, ghost) {
            piece.y -= 1;
            self.lock();
            return false;
        }
        true
    }

    /// Horizontal move by `dx` columns; mirrored while controls are flipped.
    pub fn move_piece(&mut self, dx: i32) {
        if self.game_over {
            return;
        }
        let dx = if self.rules.controls_flipped { -dx } else { dx };
        let ghost = self.rules.ghost_active();
        let Some(piece) = self.piece.as_mut() else {
            return;
        };
        piece.x += dx;
        if self.board.collides(piece, ghost) {
            piece.x -= dx;
        } else {
            self.feedback.play(Sfx::Move);
        }
    }

    /// Quarter turn with a widening left/right kick search.
    pub fn rotate(&mut self) {
        if self.game_over || !self.rules.rotation_allowed {
            return;
        }
        let ghost = self.rules.ghost_active();
        let Some(piece) = self.piece.as_mut() else {
            return;
        };
        let original = piece.clone();
        piece.shape = piece.shape.rotated();
        let width = piece.shape.width() as i32;
        let mut offset = 1;
        while self.board.collides(piece, ghost) {
            piece.x += offset;
            offset = -(offset + offset.signum());
            if offset > width {
                *piece = original;
                return;
            }
        }
        self.feedback.play(Sfx::Rotate);
    }

    pub fn soft_drop(&mut self) {
        if self.game_over || self.piece.is_none() {
            return;
        }
        self.drop_counter_ms = 0;
        if self.step_down() {
            self.feedback.play(Sfx::SoftDrop);
        }
    }

    pub fn hard_drop(&mut self) {
        if self.game_over {
            return;
        }
        let ghost = self.rules.ghost_active();
        let Some(piece) = self.piece.as_mut() else {
            return;
        };
        piece.y = self.board.landing_row(piece, ghost);
        let (cx, cy) = piece.center();
        self.drop_counter_ms = 0;
        self.feedback.play(Sfx::HardDrop);
        self.feedback.shockwave(cx, cy);
        self.lock();
    }

    /// Park the current piece, or swap it with the parked one. Once per piece.
    pub fn hold(&mut self) {
        if self.game_over || !self.rules.hold_allowed {
            return;
        }
        let Some(piece) = self.piece.take() else {
            return;
        };
        match self.held.take() {
            None => {
                self.held = Some(piece.shape);
                self.spawn();
            }
            Some(held) => {
                let swapped = Piece::spawn(held);
                if self.board.collides(&swapped, self.rules.ghost_active()) {
                    self.held = Some(swapped.shape);
                    self.piece = Some(piece);
                    return;
                }
                self.held = Some(piece.shape);
                self.piece = Some(swapped);
            }
        }
        self.rules.hold_allowed = false;
        self.feedback.play(Sfx::Hold);
    }

    /// Replace the current shape with a random one in place. Uses one chance
    /// whether or not a fitting position is found.
    pub fn shift_shape(&mut self) {
        if self.game_over || self.rules.shift_chances == 0 {
            return;
        }
        let ghost = self.rules.ghost_active();
        let Some(piece) = self.piece.as_mut() else {
            return;
        };
        self.rules.shift_chances -= 1;
        let original = piece.clone();
        piece.shape = Shape::random(&mut self.rng);

        let fits = !self.board.collides(piece, ghost)
            || SHIFT_OFFSETS.iter().any(|&dx| {
                piece.x = original.x + dx;
                !self.board.collides(piece, ghost)
            })
            || {
                piece.x = original.x;
                piece.y = original.y - 1;
                !self.board.collides(piece, ghost)
            };
        if !fits {
            *piece = original;
            return;
        }
        self.feedback.play(Sfx::Shift);
        self.feedback.notify(
            format!("Shape shifted! {} left", self.rules.shift_chances),
            1000,
        );
    }

    /// Activate the powerup in inventory `slot` (0-based).
    pub fn use_powerup(&mut self, slot: usize) {
        if self.game_over {
            return;
        }
        let Some(kind) = self.powerups.take(slot) else {
            return;
        };
        info!(?kind, slot, "powerup used");
        self.feedback.play(kind.activation_sfx());
        match kind {
            PowerupKind::AutoClear => self.auto_clear(),
            PowerupKind::Bomb => {
                self.rules.bomb_armed = true;
                self.feedback.notify("Bomb ready! Click a block", 2000);
            }
            PowerupKind::Ghost => {
                self.rules.ghost_uses = GHOST_USES;
                self.feedback
                    .notify(format!("Ghost mode: {GHOST_USES} pieces"), 1500);
            }
            PowerupKind::SlowTime => {
                self.rules.start_slow_time();
                self.feedback.notify("Time slowed!", 1500);
            }
        }
    }

    /// Detonate an armed bomb at grid cell (x, y). Clicks off the field are
    /// ignored and keep the bomb armed. Returns whether a bomb went off.
    pub fn bomb_click(&mut self, x: i32, y: i32) -> bool {
        if self.game_over || !self.rules.bomb_armed {
            return false;
        }
        if x < 0 || y < 0 || x >= COLS as i32 || y >= ROWS as i32 {
            return false;
        }
        self.rules.bomb_armed = false;
        let destroyed = self.board.blast(x, y);
        self.score += BOMB_CELL_SCORE * destroyed;
        debug!(x, y, destroyed, "bomb");
        self.feedback.play(Sfx::BombBlast);
        self.feedback.shockwave(x, y);
        if destroyed > 0 {
            self.feedback
                .notify(format!("BOOM! {destroyed} blocks destroyed"), 1500);
        } else {
            self.feedback.notify("Missed!", 1000);
        }
        true
    }

    fn auto_clear(&mut self) {
        let Some(row) = self.board.lowest_occupied_row() else {
            self.feedback.notify("Nothing to clear", 1000);
            return;
        };
        self.board.clear_rows(&[row]);
        self.score += AUTO_CLEAR_SCORE;
        self.lines_cleared += 1;
        self.feedback.notify("Bottom row cleared!", 1500);
        self.lift_piece_clear();
        self.add_level_progress(1);
    }

    /// Rows shifting down can close over a piece tucked under an overhang;
    /// push it up until it is free again.
    fn lift_piece_clear(&mut self) {
        let ghost = self.rules.ghost_active();
        if let Some(piece) = self.piece.as_mut() {
            while self.board.collides(piece, ghost) && piece.y > -(ROWS as i32) {
                piece.y -= 1;
            }
        }
    }

    fn lock(&mut self) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        self.board.merge(&piece);
        self.rules.consume_ghost();
        let rows = self.board.full_rows();
        if rows.is_empty() {
            self.combo = 0;
            self.spawn();
        } else {
            debug!(?rows, "rows complete");
            self.line_clear = LineClear::Pending { rows, frame: 0 };
        }
    }

    fn advance_line_clear(&mut self) {
        let LineClear::Pending { frame, .. } = &mut self.line_clear else {
            return;
        };
        *frame += 1;
        if *frame < CLEAR_FRAMES {
            return;
        }
        self.line_clear = LineClear::Idle;
        // powerups may have reshaped the board during the flash
        let rows = self.board.full_rows();
        if rows.is_empty() {
            self.combo = 0;
            self.spawn();
            return;
        }
        let cleared = rows.len() as u32;
        self.board.clear_rows(&rows);
        self.combo += 1;
        self.score += LINE_SCORE * cleared;
        self.lines_cleared += cleared;
        self.feedback.play(Sfx::LineClear);
        if self.combo >= 2 {
            self.feedback.notify(format!("Combo x{}!", self.combo), 1200);
        }
        self.add_level_progress(cleared);
        self.spawn();
    }

    /// Feed the level tracker; every level gained may start a challenge.
    fn add_level_progress(&mut self, lines: u32) {
        let Self {
            level,
            challenges,
            rules,
            rng,
            feedback,
            clock_ms,
            ..
        } = self;
        level.add_progress(lines, |new_level| {
            info!(level = new_level, "level up");
            feedback.play(Sfx::LevelUp);
            feedback.notify(format!("LEVEL UP! Level {new_level}"), 1500);
            challenges.on_level_reached(new_level, rules, *clock_ms, rng, feedback);
        });
        self.rules.apply_level_speed(self.level.level());
    }

    /// Promote `next` to the current piece. A blocked spawn ends the game.
    fn spawn(&mut self) {
        let fresh = Shape::random(&mut self.rng);
        let piece = Piece::spawn(std::mem::replace(&mut self.next, fresh));
        self.rules.reset_for_new_piece();
        if self.board.collides(&piece, self.rules.ghost_active()) {
            self.piece = None;
            self.game_over = true;
            info!(score = self.score, level = self.level.level(), "game over");
            self.feedback.play(Sfx::GameOver);
            return;
        }
        self.piece = Some(piece);
    }
}
