//! Surgetris: falling-block puzzle in the terminal with powerups, level
//! challenges and saved level progress.

mod app;
mod board;
mod challenge;
mod feedback;
mod game;
mod input;
mod level;
mod powerup;
mod progress;
mod rules;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use game::Game;
use progress::{FileStore, MemoryStore, ProgressStore};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Options derived from CLI that affect the frontend.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub no_animation: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, args.verbose)?;
    }

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        warn!(%err, "theme not loaded, using defaults");
        theme::Theme::load(None, args.palette).unwrap_or_default()
    });
    let store: Box<dyn ProgressStore> = if args.fresh {
        Box::new(MemoryStore::default())
    } else {
        let file = args
            .progress_file
            .as_ref()
            .map_or_else(FileStore::in_config_dir, FileStore::new);
        info!(path = %file.path().display(), "progress file");
        Box::new(file)
    };
    let game = Game::new(store, rand::random());
    info!(level = game.level().level(), "starting");

    let config = GameConfig {
        no_animation: args.no_animation,
        frame_rate: args.frame_rate,
    };
    let mut app = App::new(config, theme, game);
    app.run()?;
    Ok(())
}

/// Log to `path`; stdout belongs to the TUI.
fn init_logging(path: &Path, verbose: u8) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
    info!("Logging initialized at level: {}", level);
    Ok(())
}

/// Falling-block puzzle with powerups, level challenges and saved progress.
#[derive(Debug, Parser)]
#[command(
    name = "surgetris",
    version,
    about = "Falling-block puzzle in the terminal with powerups, level challenges and saved progress.",
    long_about = "Surgetris is a terminal falling-block puzzle.\n\n\
        Clear full rows to fill the level bar; every 10 lines is a level and your level is saved \
        between runs. Scoring and time earn powerups (auto clear, bomb, ghost, slow time) and some \
        levels throw a timed challenge at you.\n\n\
        CONTROLS:\n  Left/Right h/l  Move        Up k       Rotate      Down j     Soft drop\n  \
        Space/Enter     Hard drop   c          Hold        s/Tab      Shift shape\n  \
        1-4             Powerup     click      Bomb target p          Pause   q  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), light, high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable line-clear and shockwave effects.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Ignore saved progress; this run starts at level 1 and saves nothing.
    #[arg(long)]
    pub fresh: bool,

    /// Progress file. Defaults to the user config directory.
    #[arg(long, value_name = "FILE")]
    pub progress_file: Option<PathBuf>,

    /// Write logs to this file. No logging without it.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    Light,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "surgetris",
            "--palette",
            "colourblind",
            "--fresh",
            "-vv",
            "--log-file",
            "/tmp/s.log",
        ])
        .unwrap();
        assert_eq!(args.palette, Palette::Colorblind);
        assert!(args.fresh);
        assert_eq!(args.verbose, 2);
        assert!((args.frame_rate - 60.0).abs() < f64::EPSILON);
    }
}
