//! Persist level progress to disk (XDG config or ~/.config/surgetris).

use std::fmt::Debug;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILENAME: &str = "progress";

/// The two integers that survive between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedProgress {
    pub level: u32,
    pub progress: u32,
}

impl Default for SavedProgress {
    fn default() -> Self {
        Self {
            level: 1,
            progress: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: not a number: {value:?}")]
    Parse { line: usize, value: String },
    #[error("progress file is incomplete")]
    Incomplete,
}

/// Where level progress is loaded from and saved to.
pub trait ProgressStore: Debug {
    fn load(&self) -> Result<SavedProgress, StoreError>;
    fn save(&mut self, saved: SavedProgress) -> Result<(), StoreError>;
}

/// Two lines (level, progress) in a plain text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user config dir (config dir / surgetris / progress).
    pub fn in_config_dir() -> Self {
        Self::new(config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("surgetris").join(FILENAME)
}

impl ProgressStore for FileStore {
    fn load(&self) -> Result<SavedProgress, StoreError> {
        let content = fs::read(&self.path)?;
        let mut values = [0u32; 2];
        let mut seen = 0;
        for (i, line) in BufReader::new(&content[..]).lines().take(2).enumerate() {
            let line = line?;
            let trimmed = line.trim();
            values[i] = trimmed.parse().map_err(|_| StoreError::Parse {
                line: i + 1,
                value: trimmed.to_string(),
            })?;
            seen += 1;
        }
        if seen < 2 {
            return Err(StoreError::Incomplete);
        }
        Ok(SavedProgress {
            level: values[0],
            progress: values[1],
        })
    }

    fn save(&mut self, saved: SavedProgress) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&self.path)?;
        writeln!(f, "{}", saved.level)?;
        writeln!(f, "{}", saved.progress)?;
        Ok(())
    }
}

/// Keeps progress for this session only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<SavedProgress>,
}

impl MemoryStore {
    pub fn with(saved: SavedProgress) -> Self {
        Self { saved: Some(saved) }
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<SavedProgress, StoreError> {
        self.saved.ok_or(StoreError::Incomplete)
    }

    fn save(&mut self, saved: SavedProgress) -> Result<(), StoreError> {
        self.saved = Some(saved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("surgetris-test-{}-{}", std::process::id(), name))
            .join(FILENAME)
    }

    #[test]
    fn file_store_round_trips() {
        let path = scratch_path("roundtrip");
        let mut store = FileStore::new(&path);
        let saved = SavedProgress {
            level: 7,
            progress: 4,
        };
        store.save(saved).unwrap();
        assert_eq!(store.load().unwrap(), saved);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let store = FileStore::new(scratch_path("missing"));
        assert!(matches!(store.load(), Err(StoreError::Io(_))));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let path = scratch_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "3\nlots\n").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Parse { line: 2, .. })));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn truncated_file_is_incomplete() {
        let path = scratch_path("truncated");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "3\n").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Incomplete)));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn memory_store_starts_empty() {
        let mut store = MemoryStore::default();
        assert!(store.load().is_err());
        store.save(SavedProgress::default()).unwrap();
        assert_eq!(store.load().unwrap(), SavedProgress::default());
    }
}
