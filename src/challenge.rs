//! Level challenges: temporary rule twists drawn at odd levels from 3 to 99.

use crate::feedback::{Feedback, Sfx};
use crate::rules::{Rules, SHIFT_CHANCES};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::info;

const FIRST_CHALLENGE_LEVEL: u32 = 3;
const LAST_CHALLENGE_LEVEL: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeKind {
    FastDrop,
    NoRotate,
    FlipControls,
    BlindPreview,
    WobbleScreen,
    Glitch,
}

impl ChallengeKind {
    pub const ALL: [Self; 6] = [
        Self::FastDrop,
        Self::NoRotate,
        Self::FlipControls,
        Self::BlindPreview,
        Self::WobbleScreen,
        Self::Glitch,
    ];

    pub fn duration_ms(self) -> u64 {
        match self {
            Self::FastDrop => 20_000,
            Self::NoRotate => 15_000,
            Self::FlipControls => 10_000,
            Self::BlindPreview => 30_000,
            Self::WobbleScreen => 10_000,
            Self::Glitch => 10_000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FastDrop => "Fast Drop",
            Self::NoRotate => "No Rotation",
            Self::FlipControls => "Reversed",
            Self::BlindPreview => "Blind",
            Self::WobbleScreen => "Wobble",
            Self::Glitch => "Glitch",
        }
    }

    /// Announcement shown when the challenge starts.
    pub fn message(self) -> String {
        let secs = self.duration_ms() / 1000;
        match self {
            Self::FastDrop => format!("ULTRA Fast Drop for {secs}s! GOOD LUCK!"),
            Self::NoRotate => format!("No Rotation for {secs} seconds!"),
            Self::FlipControls => format!("Controls Reversed for {secs} seconds!"),
            Self::BlindPreview => format!("Preview Hidden for {secs} seconds!"),
            Self::WobbleScreen => format!("Screen Wobble for {secs} seconds!"),
            Self::Glitch => format!("GLITCH MODE for {secs} seconds!"),
        }
    }

    fn apply(self, rules: &mut Rules) {
        match self {
            Self::FastDrop => rules.start_fast_drop(),
            Self::NoRotate => rules.rotation_allowed = false,
            Self::FlipControls => rules.controls_flipped = true,
            Self::BlindPreview => rules.preview_visible = false,
            Self::WobbleScreen => {}
            Self::Glitch => {
                rules.hold_shift_suspended = true;
                rules.hold_allowed = false;
                rules.shift_chances = 0;
                rules.preview_visible = false;
            }
        }
    }

    fn revert(self, rules: &mut Rules, level: u32) {
        match self {
            Self::FastDrop => rules.end_fast_drop(level),
            Self::NoRotate => rules.rotation_allowed = true,
            Self::FlipControls => rules.controls_flipped = false,
            Self::BlindPreview => rules.preview_visible = true,
            Self::WobbleScreen => {}
            Self::Glitch => {
                rules.hold_shift_suspended = false;
                rules.hold_allowed = true;
                rules.shift_chances = SHIFT_CHANCES;
                rules.preview_visible = true;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChallenge {
    pub kind: ChallengeKind,
    /// Simulation clock (ms) when it started.
    pub started_ms: u64,
    /// Simulation clock (ms) when it reverts.
    pub deadline_ms: u64,
}

impl ActiveChallenge {
    /// Fraction of the duration still to run, 1.0 at start.
    pub fn remaining_ratio(&self, now_ms: u64) -> f64 {
        let total = self.deadline_ms.saturating_sub(self.started_ms).max(1);
        let left = self.deadline_ms.saturating_sub(now_ms);
        (left as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct Challenges {
    /// Shuffled kinds not yet drawn; drawn from the back.
    pool: Vec<ChallengeKind>,
    triggered: HashSet<u32>,
    active: Option<ActiveChallenge>,
}

impl Challenges {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut challenges = Self::default();
        challenges.refill(rng);
        challenges
    }

    pub fn active(&self) -> Option<&ActiveChallenge> {
        self.active.as_ref()
    }

    pub fn is_active(&self, kind: ChallengeKind) -> bool {
        self.active.is_some_and(|a| a.kind == kind)
    }

    #[cfg(test)]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pool = ChallengeKind::ALL.to_vec();
        self.pool.shuffle(rng);
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ChallengeKind {
        if self.pool.is_empty() {
            self.refill(rng);
        }
        // refill always leaves six kinds behind
        self.pool.pop().unwrap_or(ChallengeKind::FastDrop)
    }

    /// Level-up hook. Eligible levels are odd, within 3..=99, and fire once per
    /// session. The level is spent even when another challenge is still
    /// running; the drawn kind is then discarded.
    pub fn on_level_reached<R: Rng + ?Sized>(
        &mut self,
        level: u32,
        rules: &mut Rules,
        now_ms: u64,
        rng: &mut R,
        feedback: &mut Feedback,
    ) -> Option<ChallengeKind> {
        if level % 2 == 0
            || !(FIRST_CHALLENGE_LEVEL..=LAST_CHALLENGE_LEVEL).contains(&level)
            || !self.triggered.insert(level)
        {
            return None;
        }
        let kind = self.draw(rng);
        if self.active.is_some() {
            info!(level, ?kind, "challenge skipped, another is running");
            return None;
        }
        kind.apply(rules);
        self.active = Some(ActiveChallenge {
            kind,
            started_ms: now_ms,
            deadline_ms: now_ms + kind.duration_ms(),
        });
        info!(level, ?kind, "challenge started");
        feedback.play(if kind == ChallengeKind::Glitch {
            Sfx::Glitch
        } else {
            Sfx::Challenge
        });
        feedback.notify(kind.message(), kind.duration_ms());
        Some(kind)
    }

    /// Revert the active challenge once its deadline has passed.
    pub fn update(&mut self, now_ms: u64, rules: &mut Rules, level: u32) -> Option<ChallengeKind> {
        let active = self.active?;
        if now_ms < active.deadline_ms {
            return None;
        }
        active.kind.revert(rules, level);
        self.active = None;
        info!(kind = ?active.kind, "challenge over");
        Some(active.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::drop_interval;
    use crate::rules::FAST_DROP_INTERVAL_MS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        challenges: Challenges,
        rules: Rules,
        rng: StdRng,
        feedback: Feedback,
    }

    impl Fixture {
        fn new() -> Self {
            let mut rng = StdRng::seed_from_u64(7);
            Self {
                challenges: Challenges::new(&mut rng),
                rules: Rules::new(1),
                rng,
                feedback: Feedback::default(),
            }
        }

        fn reach(&mut self, level: u32, now_ms: u64) -> Option<ChallengeKind> {
            self.challenges.on_level_reached(
                level,
                &mut self.rules,
                now_ms,
                &mut self.rng,
                &mut self.feedback,
            )
        }

        fn expire(&mut self, level: u32) -> Option<ChallengeKind> {
            self.challenges.update(u64::MAX, &mut self.rules, level)
        }
    }

    #[test]
    fn only_odd_levels_in_range_trigger() {
        let mut f = Fixture::new();
        for level in [1, 2, 4, 100, 101] {
            assert_eq!(f.reach(level, 0), None, "level {level}");
        }
        assert!(f.reach(3, 0).is_some());
        f.expire(3);
        assert!(f.reach(99, 0).is_some());
    }

    #[test]
    fn a_level_fires_once_per_session() {
        let mut f = Fixture::new();
        assert!(f.reach(5, 0).is_some());
        f.expire(5);
        assert_eq!(f.reach(5, 0), None);
        assert!(f.challenges.active().is_none());
    }

    #[test]
    fn one_at_a_time_and_busy_levels_are_spent() {
        let mut f = Fixture::new();
        assert!(f.reach(3, 0).is_some());
        let first = f.challenges.active().copied();
        assert_eq!(f.reach(5, 100), None);
        assert_eq!(f.challenges.active().copied(), first);
        f.expire(5);
        assert_eq!(f.reach(5, 200), None);
    }

    #[test]
    fn pool_draws_every_kind_before_repeating() {
        let mut f = Fixture::new();
        let mut seen = HashSet::new();
        for level in (3..=13).step_by(2) {
            let kind = f.reach(level, 0).unwrap();
            f.expire(level);
            assert!(seen.insert(kind), "{kind:?} drawn twice");
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(f.challenges.pool_len(), 0);
        assert!(f.reach(15, 0).is_some());
        assert_eq!(f.challenges.pool_len(), 5);
    }

    #[test]
    fn reverts_at_deadline() {
        let mut f = Fixture::new();
        let kind = f.reach(3, 1_000).unwrap();
        let deadline = 1_000 + kind.duration_ms();
        assert_eq!(f.challenges.update(deadline - 1, &mut f.rules, 1), None);
        assert_eq!(f.challenges.update(deadline, &mut f.rules, 1), Some(kind));
        assert_eq!(f.rules, Rules::new(1));
    }

    #[test]
    fn every_kind_reverts_to_defaults() {
        for kind in ChallengeKind::ALL {
            let mut rules = Rules::new(4);
            kind.apply(&mut rules);
            assert_ne!(
                rules == Rules::new(4),
                kind != ChallengeKind::WobbleScreen,
                "{kind:?}"
            );
            kind.revert(&mut rules, 4);
            assert_eq!(rules, Rules::new(4), "{kind:?}");
        }
    }

    #[test]
    fn fast_drop_pins_interval_and_recomputes_on_revert() {
        let mut rules = Rules::new(3);
        ChallengeKind::FastDrop.apply(&mut rules);
        assert_eq!(rules.drop_interval_ms, FAST_DROP_INTERVAL_MS);
        ChallengeKind::FastDrop.revert(&mut rules, 6);
        assert_eq!(rules.drop_interval_ms, drop_interval(6));
    }

    #[test]
    fn start_announces_itself() {
        let mut f = Fixture::new();
        let kind = f.reach(3, 0).unwrap();
        assert!(f.feedback.cues().iter().any(|c| matches!(
            c,
            crate::feedback::Cue::Notice { text, .. } if *text == kind.message()
        )));
    }

    #[test]
    fn remaining_ratio_runs_down() {
        let a = ActiveChallenge {
            kind: ChallengeKind::Glitch,
            started_ms: 0,
            deadline_ms: 10_000,
        };
        assert!((a.remaining_ratio(0) - 1.0).abs() < f64::EPSILON);
        assert!((a.remaining_ratio(5_000) - 0.5).abs() < 1e-9);
        assert!(a.remaining_ratio(20_000).abs() < f64::EPSILON);
    }
}
