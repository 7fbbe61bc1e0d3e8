//! Application configuration, loaded from TOML.
//!
//! Every field has a default, so an empty or partial file is valid.  The
//! file is looked up at `--config <path>` or, failing that, at
//! `<config_dir>/air_keyboard/config.toml`; when neither exists the
//! built-in defaults are used.
//!
//! ```toml
//! quit_key = "q"
//! max_capture_failures = 300
//!
//! [keyboard]
//! click_delay_ms = 400
//!
//! [camera]
//! source = "ffmpeg"
//! device = "/dev/video0"
//!
//! [detector]
//! kind = "pipe"
//! command = ["python3", "hand_detect.py"]
//! max_hands = 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use air_keys::{build_keyboard, Keyboard, KeyboardGeometry, DEFAULT_ROWS};

use crate::camera::CameraConfig;
use crate::detector::DetectorConfig;
use crate::error::ConfigError;
use crate::render::Theme;

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
    pub title:  String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width:  1280,
            height: 720,
            title:  "Air Keyboard".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Minimum time between two accepted clicks of the same key.
    pub click_delay_ms: u64,
    /// Replaces the QWERTY rows when set.  EXIT is always added.
    pub rows:           Option<Vec<Vec<String>>>,
    /// `canvas_width` is overridden by the window width.
    pub geometry:       KeyboardGeometry,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        KeyboardConfig {
            click_delay_ms: 400,
            rows:           None,
            geometry:       KeyboardGeometry::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host key that ends the session.
    pub quit_key:             char,
    /// Give up after this many consecutive failed frame grabs.  Unset means
    /// retry forever.
    pub max_capture_failures: Option<u32>,
    pub window:               WindowConfig,
    pub keyboard:             KeyboardConfig,
    pub camera:               CameraConfig,
    pub detector:             DetectorConfig,
    pub theme:                Theme,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            quit_key:             'q',
            max_capture_failures: None,
            window:               WindowConfig::default(),
            keyboard:             KeyboardConfig::default(),
            camera:               CameraConfig::default(),
            detector:             DetectorConfig::default(),
            theme:                Theme::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/air_keyboard/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("air_keyboard").join("config.toml"))
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => {
                    log::debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.keyboard.click_delay_ms)
    }

    /// The keyboard described by this config, laid out for the window width.
    pub fn build_keyboard(&self) -> Keyboard {
        let geometry = KeyboardGeometry {
            canvas_width: self.window.width as i32,
            ..self.keyboard.geometry
        };
        match &self.keyboard.rows {
            Some(rows) => build_keyboard(rows, &geometry, self.click_delay()),
            None       => build_keyboard(DEFAULT_ROWS, &geometry, self.click_delay()),
        }
    }
}
