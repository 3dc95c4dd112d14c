//! Powerups: when they are granted, the inventory, and the weighted draw.
//! Activation effects live on `Game` because they touch the board.

use crate::feedback::{Feedback, Sfx};
use rand::Rng;
use tracing::debug;

/// Inventory slots.
pub const MAX_INVENTORY: usize = 4;
/// Score step between score-triggered grants.
const SCORE_STEP: u32 = 1500;
/// A grant is due once this much simulated time passes without one.
const GRANT_EVERY_MS: u64 = 60_000;
const COMBO_TRIGGER: u32 = 3;
const COMBO_CHANCE: f64 = 0.4;
/// Minimum gap after the last grant before a combo may grant again.
const COMBO_COOLDOWN_MS: u64 = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    AutoClear,
    Bomb,
    Ghost,
    SlowTime,
}

/// Relative odds of each kind being granted.
pub const WEIGHTS: [(PowerupKind, u32); 4] = [
    (PowerupKind::AutoClear, 2),
    (PowerupKind::Bomb, 2),
    (PowerupKind::Ghost, 1),
    (PowerupKind::SlowTime, 2),
];

impl PowerupKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::AutoClear => "Auto Clear",
            Self::Bomb => "Bomb",
            Self::Ghost => "Ghost Mode",
            Self::SlowTime => "Slow Time",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AutoClear => "Clears bottom row",
            Self::Bomb => "Click to destroy 3x3 area",
            Self::Ghost => "Next 3 pieces pass through blocks",
            Self::SlowTime => "Slow drop speed for 15s",
        }
    }

    /// Display colour as "#RRGGBB".
    pub fn color_hex(self) -> &'static str {
        match self {
            Self::AutoClear => "#FFD700",
            Self::Bomb => "#FF4500",
            Self::Ghost => "#9370DB",
            Self::SlowTime => "#00CED1",
        }
    }

    /// Single-cell marker for the inventory strip.
    pub fn glyph(self) -> char {
        match self {
            Self::AutoClear => 'A',
            Self::Bomb => 'B',
            Self::Ghost => 'G',
            Self::SlowTime => 'S',
        }
    }

    pub fn activation_sfx(self) -> Sfx {
        match self {
            Self::AutoClear => Sfx::AutoClear,
            Self::Bomb => Sfx::BombArmed,
            Self::Ghost => Sfx::Ghost,
            Self::SlowTime => Sfx::SlowTime,
        }
    }
}

/// Cumulative-distribution draw over `WEIGHTS`: roll in `0..total`, then walk
/// the table subtracting each weight until the roll falls inside one.
pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> PowerupKind {
    let total: u32 = WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (kind, weight) in WEIGHTS {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    WEIGHTS[WEIGHTS.len() - 1].0
}

/// Which rule handed out a powerup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Score,
    Timer,
    Combo,
}

#[derive(Debug)]
pub struct Powerups {
    inventory: Vec<PowerupKind>,
    next_score_threshold: u32,
    last_grant_ms: u64,
}

impl Default for Powerups {
    fn default() -> Self {
        Self {
            inventory: Vec::with_capacity(MAX_INVENTORY),
            next_score_threshold: SCORE_STEP,
            last_grant_ms: 0,
        }
    }
}

impl Powerups {
    pub fn inventory(&self) -> &[PowerupKind] {
        &self.inventory
    }

    pub fn next_score_threshold(&self) -> u32 {
        self.next_score_threshold
    }

    /// Add to the inventory; a full inventory drops the grant silently.
    pub fn grant(&mut self, kind: PowerupKind, feedback: &mut Feedback) -> bool {
        if self.inventory.len() >= MAX_INVENTORY {
            debug!(?kind, "inventory full, powerup dropped");
            return false;
        }
        self.inventory.push(kind);
        feedback.play(Sfx::PowerupGranted);
        feedback.notify(format!("{}!", kind.name()), 1200);
        true
    }

    /// Evaluate the grant rules in order; at most one fires per call. A rule
    /// that fires is spent even if the inventory had no room.
    pub fn check_triggers<R: Rng + ?Sized>(
        &mut self,
        score: u32,
        combo: u32,
        now_ms: u64,
        rng: &mut R,
        feedback: &mut Feedback,
    ) -> Option<Trigger> {
        let trigger = if score >= self.next_score_threshold {
            self.next_score_threshold += SCORE_STEP;
            Trigger::Score
        } else if now_ms.saturating_sub(self.last_grant_ms) > GRANT_EVERY_MS {
            self.last_grant_ms = now_ms;
            Trigger::Timer
        } else if combo >= COMBO_TRIGGER
            && rng.random_bool(COMBO_CHANCE)
            && now_ms.saturating_sub(self.last_grant_ms) > COMBO_COOLDOWN_MS
        {
            self.last_grant_ms = now_ms;
            Trigger::Combo
        } else {
            return None;
        };
        let kind = pick(rng);
        debug!(?trigger, ?kind, "powerup trigger");
        self.grant(kind, feedback);
        Some(trigger)
    }

    /// Remove the powerup in `slot` (0-based). Empty slots yield nothing.
    pub fn take(&mut self, slot: usize) -> Option<PowerupKind> {
        (slot < self.inventory.len()).then(|| self.inventory.remove(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn inventory_caps_at_four() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        for _ in 0..10 {
            p.grant(PowerupKind::Bomb, &mut fb);
        }
        assert_eq!(p.inventory().len(), MAX_INVENTORY);
        assert!(!p.grant(PowerupKind::Ghost, &mut fb));
    }

    #[test]
    fn frequent_triggers_never_overflow() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        let mut rng = StdRng::seed_from_u64(1);
        for i in 0..200u64 {
            p.check_triggers(i as u32 * 1500, 5, i * 61_000, &mut rng, &mut fb);
            assert!(p.inventory().len() <= MAX_INVENTORY);
        }
    }

    #[test]
    fn score_threshold_steps_by_1500() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(p.check_triggers(1499, 0, 0, &mut rng, &mut fb), None);
        assert_eq!(
            p.check_triggers(1500, 0, 0, &mut rng, &mut fb),
            Some(Trigger::Score)
        );
        assert_eq!(p.next_score_threshold(), 3000);
        // a big jump only claims one threshold per tick
        assert_eq!(
            p.check_triggers(9000, 0, 0, &mut rng, &mut fb),
            Some(Trigger::Score)
        );
        assert_eq!(p.next_score_threshold(), 4500);
    }

    #[test]
    fn timer_grants_after_a_quiet_minute() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(p.check_triggers(0, 0, 60_000, &mut rng, &mut fb), None);
        assert_eq!(
            p.check_triggers(0, 0, 60_001, &mut rng, &mut fb),
            Some(Trigger::Timer)
        );
        assert_eq!(p.check_triggers(0, 0, 100_000, &mut rng, &mut fb), None);
    }

    #[test]
    fn combo_respects_cooldown() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            assert_eq!(p.check_triggers(0, 3, 8_000, &mut rng, &mut fb), None);
        }
        let fired = (0..100).any(|_| {
            p.check_triggers(0, 3, 8_001, &mut rng, &mut fb) == Some(Trigger::Combo)
        });
        assert!(fired);
        assert_eq!(p.check_triggers(0, 3, 9_000, &mut rng, &mut fb), None);
    }

    #[test]
    fn combo_below_three_never_grants() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(p.check_triggers(0, 2, 30_000, &mut rng, &mut fb), None);
        }
    }

    #[test]
    fn take_removes_and_shifts_slots() {
        let mut p = Powerups::default();
        let mut fb = Feedback::default();
        p.grant(PowerupKind::Bomb, &mut fb);
        p.grant(PowerupKind::Ghost, &mut fb);
        assert_eq!(p.take(3), None);
        assert_eq!(p.take(0), Some(PowerupKind::Bomb));
        assert_eq!(p.inventory(), &[PowerupKind::Ghost]);
    }

    #[test]
    fn weighted_draw_follows_table() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut counts: HashMap<PowerupKind, u32> = HashMap::new();
        let n = 70_000;
        for _ in 0..n {
            *counts.entry(pick(&mut rng)).or_default() += 1;
        }
        for (kind, weight) in WEIGHTS {
            let expected = f64::from(n) * f64::from(weight) / 7.0;
            let got = f64::from(counts[&kind]);
            assert!((got - expected).abs() < expected * 0.05, "{kind:?}: {got}");
        }
    }
}
