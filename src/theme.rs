//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours for indices 1..=8, dark background.
const DARK_BLOCKS: [u32; 8] = [
    0x00F0F0, 0x0000F0, 0xF0A000, 0xF0F000, 0x00F000, 0xA000F0, 0xF00000, 0x00C0FF,
];
/// Softer block colours for light terminals.
const LIGHT_BLOCKS: [u32; 8] = [
    0x80D8D8, 0x92AAFC, 0xF7AB73, 0xF2E665, 0x85D98E, 0xCE96F2, 0xF47B7B, 0x87C9FF,
];
const HIGH_CONTRAST_BLOCKS: [u32; 8] = [
    0x00FFFF, 0x0088FF, 0xFF8800, 0xFFFF00, 0x00FF00, 0xFF00FF, 0xFF0000, 0xFFFFFF,
];
/// Tol/Okabe-Ito style set that avoids red/green pairs.
const COLORBLIND_BLOCKS: [u32; 8] = [
    0x33BBEE, 0x0077BB, 0xEE7733, 0xBBBB00, 0x009988, 0xAA3377, 0xCC3311, 0x88CCEE,
];

/// Block and UI colours loaded from a theme file.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Colour of grid value `i` is `blocks[i - 1]`.
    pub blocks: [Color; 8],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Ghost outline, hidden preview, empty inventory slots.
    pub inactive_fg: Color,
    /// Completed rows while they flash.
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark UI colours around the classic block set.
    pub fn onedark_default() -> Self {
        Self {
            blocks: DARK_BLOCKS.map(Color::from_u32),
            bg: Color::from_u32(0x282C34),
            div_line: Color::from_u32(0x3F444F),
            main_fg: Color::from_u32(0xABB2BF),
            title: Color::from_u32(0xE5C07B),
            inactive_fg: Color::from_u32(0x5C6370),
            flash: Color::from_u32(0xFFFFFF),
        }
    }

    /// Light background variant.
    pub fn light_default() -> Self {
        Self {
            blocks: LIGHT_BLOCKS.map(Color::from_u32),
            bg: Color::from_u32(0xFAFAFA),
            div_line: Color::from_u32(0xD0D0D0),
            main_fg: Color::from_u32(0x383A42),
            title: Color::from_u32(0xC18401),
            inactive_fg: Color::from_u32(0xA0A1A7),
            flash: Color::from_u32(0x383A42),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Without a file (or when it does not exist) the palette's defaults are used.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::default_for_palette(palette);
        theme.merge_map(&map)?;
        Ok(theme)
    }

    fn default_for_palette(palette: Palette) -> Self {
        let mut t = match palette {
            Palette::Light => Self::light_default(),
            _ => Self::onedark_default(),
        };
        t.apply_palette(palette);
        t
    }

    /// Swap in the block set for high-contrast or colourblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal | Palette::Light => {}
            Palette::HighContrast => self.blocks = HIGH_CONTRAST_BLOCKS.map(Color::from_u32),
            Palette::Colorblind => self.blocks = COLORBLIND_BLOCKS.map(Color::from_u32),
        }
    }

    /// Override colours from the file. Keys `block1`..`block8` set block
    /// colours; the rest follow btop's names (`meter_bg`, `div_line`, ...).
    fn merge_map(&mut self, map: &HashMap<String, String>) -> Result<(), ThemeError> {
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (i, block) in self.blocks.iter_mut().enumerate() {
            if let Some(c) = get(&format!("block{}", i + 1))? {
                *block = c;
            }
        }
        let ui = [
            ("meter_bg", &mut self.bg),
            ("div_line", &mut self.div_line),
            ("main_fg", &mut self.main_fg),
            ("title", &mut self.title),
            ("inactive_fg", &mut self.inactive_fg),
            ("selected_fg", &mut self.flash),
        ];
        for (key, slot) in ui {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        Ok(())
    }

    /// Colour for grid value 1..=8.
    #[inline]
    pub fn block_color(&self, value: u8) -> Color {
        self.blocks[(value.max(1) as usize - 1) % self.blocks.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
