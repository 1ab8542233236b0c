/// User settings and on-disk locations
///
/// Settings are read from `settings.json` in the user's config directory:
/// - Linux: ~/.config/photo-grid/settings.json
/// - macOS: ~/Library/Application Support/photo-grid/settings.json
/// - Windows: %APPDATA%\photo-grid\settings.json
///
/// A missing file means defaults. A malformed file is reported and ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::imaging::thumbnail::THUMBNAIL_SIZE;

const APP_DIR: &str = "photo-grid";
const SETTINGS_FILE: &str = "settings.json";
const LIBRARY_FILE: &str = "library.db";

/// Width of one grid tile in logical pixels
pub const DEFAULT_TILE_WIDTH: f32 = 200.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Longest edge of generated thumbnails
    pub thumbnail_size: u32,
    /// Tile width in the grid; tile height follows the image's aspect ratio
    pub tile_width: f32,
    /// Directory holding the library database instead of the data directory
    pub library_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thumbnail_size: THUMBNAIL_SIZE,
            tile_width: DEFAULT_TILE_WIDTH,
            library_dir: None,
        }
    }
}

impl Settings {
    /// Load from the user's config directory
    pub fn load() -> Self {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("⚠️  Could not read {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("⚠️  Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Where the library database lives
    pub fn library_path(&self) -> PathBuf {
        let mut path = match &self.library_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir(),
        };
        path.push(LIBRARY_FILE);
        path
    }

    // Zero sizes would produce empty tiles
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.thumbnail_size == 0 {
            self.thumbnail_size = defaults.thumbnail_size;
        }
        if !(self.tile_width.is_finite() && self.tile_width > 0.0) {
            self.tile_width = defaults.tile_width;
        }
        self
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// `<data_dir>/photo-grid`, or `~/photo-grid` when there is no data dir
fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}
