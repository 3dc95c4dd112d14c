//! Outbox of fire-and-forget cues (sounds, notices, shockwaves) the game
//! raises for the frontend. The game never waits on them.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Move,
    Rotate,
    SoftDrop,
    HardDrop,
    LineClear,
    LevelUp,
    GameOver,
    Hold,
    Shift,
    PowerupGranted,
    AutoClear,
    BombArmed,
    BombBlast,
    Ghost,
    SlowTime,
    Challenge,
    Glitch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    Sound(Sfx),
    Notice { text: String, duration: Duration },
    /// Hard-drop landing centre, in grid cells.
    Shockwave { x: i32, y: i32 },
}

#[derive(Debug, Default)]
pub struct Feedback {
    cues: Vec<Cue>,
}

impl Feedback {
    pub fn play(&mut self, sfx: Sfx) {
        self.cues.push(Cue::Sound(sfx));
    }

    pub fn notify(&mut self, text: impl Into<String>, duration_ms: u64) {
        self.cues.push(Cue::Notice {
            text: text.into(),
            duration: Duration::from_millis(duration_ms),
        });
    }

    pub fn shockwave(&mut self, x: i32, y: i32) {
        self.cues.push(Cue::Shockwave { x, y });
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Cue> {
        self.cues.drain(..)
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    #[cfg(test)]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }
}
