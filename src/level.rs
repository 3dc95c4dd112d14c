//! Level tracker: cleared lines feed a 10-line bar; each full bar is a level.

use crate::progress::{ProgressStore, SavedProgress};
use tracing::{debug, warn};

/// Lines needed per level.
pub const LINES_PER_LEVEL: u32 = 10;
/// Fastest level-derived gravity.
pub const MIN_DROP_INTERVAL_MS: u32 = 100;

/// Gravity interval for a level: `max(100, floor(1000 / (1 + (level-1) * 0.12)))`.
pub fn drop_interval(level: u32) -> u32 {
    let steps = f64::from(level.max(1) - 1);
    let raw = (1000.0 / (1.0 + steps * 0.12)).floor() as u32;
    raw.max(MIN_DROP_INTERVAL_MS)
}

#[derive(Debug)]
pub struct LevelTracker {
    level: u32,
    progress: u32,
    store: Box<dyn ProgressStore>,
}

impl LevelTracker {
    /// Read saved progress; anything unreadable starts at level 1.
    pub fn load(store: Box<dyn ProgressStore>) -> Self {
        let saved = store.load().unwrap_or_else(|err| {
            debug!(%err, "no saved progress, starting at level 1");
            SavedProgress::default()
        });
        let mut tracker = Self {
            level: saved.level.max(1),
            progress: 0,
            store,
        };
        tracker.level = tracker.level.saturating_add(saved.progress / LINES_PER_LEVEL);
        tracker.progress = saved.progress % LINES_PER_LEVEL;
        tracker
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Lines toward the next level, always below `LINES_PER_LEVEL`.
    #[inline]
    pub fn progress(&self) -> u32 {
        self.progress
    }

    #[cfg(test)]
    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    /// Add cleared lines. `on_level_up` runs once per level gained, in order.
    pub fn add_progress(&mut self, lines: u32, mut on_level_up: impl FnMut(u32)) {
        self.progress = self.progress.saturating_add(lines);
        while self.progress >= LINES_PER_LEVEL {
            self.progress -= LINES_PER_LEVEL;
            self.level = self.level.saturating_add(1);
            on_level_up(self.level);
        }
        self.persist();
    }

    /// Back to level 1 for a new game.
    pub fn reset(&mut self) {
        self.level = 1;
        self.progress = 0;
        self.persist();
    }

    fn persist(&mut self) {
        let saved = SavedProgress {
            level: self.level,
            progress: self.progress,
        };
        if let Err(err) = self.store.save(saved) {
            warn!(%err, "could not save level progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;

    fn fresh() -> LevelTracker {
        LevelTracker::load(Box::new(MemoryStore::default()))
    }

    #[test]
    fn drop_interval_starts_at_one_second() {
        assert_eq!(drop_interval(1), 1000);
        assert_eq!(drop_interval(0), 1000);
        assert_eq!(drop_interval(2), 892);
    }

    #[test]
    fn drop_interval_decreases_until_clamped() {
        for level in 1..75 {
            assert!(drop_interval(level + 1) < drop_interval(level), "level {level}");
        }
        for level in 1..1000 {
            assert!(drop_interval(level) >= MIN_DROP_INTERVAL_MS);
        }
        assert_eq!(drop_interval(500), MIN_DROP_INTERVAL_MS);
    }

    #[test]
    fn ten_lines_is_one_level() {
        let mut t = fresh();
        let mut reached = Vec::new();
        t.add_progress(10, |l| reached.push(l));
        assert_eq!((t.level(), t.progress()), (2, 0));
        assert_eq!(reached, vec![2]);
    }

    #[test]
    fn large_batches_loop_through_levels() {
        let mut t = fresh();
        let mut reached = Vec::new();
        t.add_progress(25, |l| reached.push(l));
        assert_eq!((t.level(), t.progress()), (3, 5));
        assert_eq!(reached, vec![2, 3]);
    }

    #[test]
    fn progress_is_saved_after_every_update() {
        let mut t = fresh();
        t.add_progress(3, |_| {});
        assert_eq!(
            t.store().load().unwrap(),
            SavedProgress {
                level: 1,
                progress: 3
            }
        );
        t.add_progress(8, |_| {});
        assert_eq!(
            t.store().load().unwrap(),
            SavedProgress {
                level: 2,
                progress: 1
            }
        );
    }

    #[test]
    fn loads_and_normalizes_saved_state() {
        let t = LevelTracker::load(Box::new(MemoryStore::with(SavedProgress {
            level: 0,
            progress: 13,
        })));
        assert_eq!((t.level(), t.progress()), (2, 3));
    }

    #[test]
    fn absurd_saved_level_saturates() {
        let mut t = LevelTracker::load(Box::new(MemoryStore::with(SavedProgress {
            level: u32::MAX,
            progress: 15,
        })));
        assert_eq!((t.level(), t.progress()), (u32::MAX, 5));
        let mut reached = Vec::new();
        t.add_progress(5, |l| reached.push(l));
        assert_eq!((t.level(), t.progress()), (u32::MAX, 0));
        assert_eq!(reached, vec![u32::MAX]);
    }

    #[test]
    fn reset_persists_level_one() {
        let mut t = LevelTracker::load(Box::new(MemoryStore::with(SavedProgress {
            level: 9,
            progress: 2,
        })));
        t.reset();
        assert_eq!(t.store().load().unwrap(), SavedProgress::default());
    }
}
