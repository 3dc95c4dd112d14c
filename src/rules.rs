//! Rules in effect: the simulation parameters powerups and challenges rewrite.

use crate::level::drop_interval;

/// Shape shifts granted to every new piece.
pub const SHIFT_CHANCES: u8 = 2;
/// Drop interval while the fast-drop challenge runs.
pub const FAST_DROP_INTERVAL_MS: u32 = 10;
/// Slow-time duration in simulated milliseconds.
pub const SLOW_TIME_MS: u32 = 15_000;
const SLOW_TIME_FACTOR: u32 = 3;
const SLOW_TIME_FLOOR_MS: u32 = 300;
/// Landings a ghost powerup lasts for.
pub const GHOST_USES: u8 = 3;

/// Shared simulation parameters. The controller and the main loop read these
/// every tick; powerups and challenges are the only writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    /// Live gravity interval in ms.
    pub drop_interval_ms: u32,
    /// Level-derived interval; what speed effects restore to.
    pub base_drop_interval_ms: u32,
    pub rotation_allowed: bool,
    pub controls_flipped: bool,
    /// Hold availability for the current piece.
    pub hold_allowed: bool,
    /// Shifts left for the current piece.
    pub shift_chances: u8,
    pub preview_visible: bool,
    /// Landings left before ghost mode ends.
    pub ghost_uses: u8,
    /// Next play-field click detonates a bomb.
    pub bomb_armed: bool,
    /// Fast-drop challenge holds the interval at its minimum.
    pub fast_drop: bool,
    /// Remaining slow-time in ms (0 = inactive).
    pub slow_time_ms: u32,
    /// Glitch challenge: new pieces get no hold and no shifts.
    pub hold_shift_suspended: bool,
}

impl Rules {
    pub fn new(level: u32) -> Self {
        let interval = drop_interval(level);
        Self {
            drop_interval_ms: interval,
            base_drop_interval_ms: interval,
            rotation_allowed: true,
            controls_flipped: false,
            hold_allowed: true,
            shift_chances: SHIFT_CHANCES,
            preview_visible: true,
            ghost_uses: 0,
            bomb_armed: false,
            fast_drop: false,
            slow_time_ms: 0,
            hold_shift_suspended: false,
        }
    }

    #[inline]
    pub fn ghost_active(&self) -> bool {
        self.ghost_uses > 0
    }

    #[inline]
    pub fn slow_time_active(&self) -> bool {
        self.slow_time_ms > 0
    }

    pub fn reset_for_new_piece(&mut self) {
        self.hold_allowed = !self.hold_shift_suspended;
        self.shift_chances = if self.hold_shift_suspended {
            0
        } else {
            SHIFT_CHANCES
        };
    }

    /// One piece landed.
    pub fn consume_ghost(&mut self) {
        self.ghost_uses = self.ghost_uses.saturating_sub(1);
    }

    /// Recompute speed after a level change. A running speed effect keeps the
    /// live interval; only the restore target moves.
    pub fn apply_level_speed(&mut self, level: u32) {
        self.base_drop_interval_ms = drop_interval(level);
        if !self.fast_drop && !self.slow_time_active() {
            self.drop_interval_ms = self.base_drop_interval_ms;
        }
    }

    pub fn start_slow_time(&mut self) {
        if !self.slow_time_active() {
            self.drop_interval_ms = slowed(self.drop_interval_ms);
        }
        self.slow_time_ms = SLOW_TIME_MS;
    }

    /// Count slow-time down. Returns true on the tick it expires.
    pub fn tick_slow_time(&mut self, delta_ms: u32) -> bool {
        if !self.slow_time_active() {
            return false;
        }
        self.slow_time_ms = self.slow_time_ms.saturating_sub(delta_ms);
        if self.slow_time_active() {
            return false;
        }
        self.drop_interval_ms = if self.fast_drop {
            FAST_DROP_INTERVAL_MS
        } else {
            self.base_drop_interval_ms
        };
        true
    }

    pub fn start_fast_drop(&mut self) {
        self.fast_drop = true;
        self.drop_interval_ms = FAST_DROP_INTERVAL_MS;
    }

    pub fn end_fast_drop(&mut self, level: u32) {
        self.fast_drop = false;
        self.base_drop_interval_ms = drop_interval(level);
        self.drop_interval_ms = if self.slow_time_active() {
            slowed(self.base_drop_interval_ms)
        } else {
            self.base_drop_interval_ms
        };
    }
}

fn slowed(interval: u32) -> u32 {
    interval.saturating_mul(SLOW_TIME_FACTOR).max(SLOW_TIME_FLOOR_MS)
}
