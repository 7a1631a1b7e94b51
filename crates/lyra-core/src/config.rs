//! Editor configuration, read from `<config_dir>/lyra/config.toml`.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! wants to change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paint::Rgb;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub gutter: GutterConfig,
    pub ui: UiConfig,
    pub colors: ColorScheme,

    /// Extra extension-to-language mappings, e.g. `inc = "cpp"`
    pub languages: HashMap<String, String>,
}

impl Config {
    /// Loads the config from the default location, falling back to defaults
    /// when it is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads the config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("lyra").join("config.toml"))
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }
}

/// Editing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tab stop width in columns
    pub tab_size: usize,

    /// Soft-wrap long lines at the viewport width
    pub word_wrap: bool,

    /// Undo steps kept per document
    pub undo_limit: usize,

    /// Lines kept in view when paging up or down
    pub page_overlap_lines: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            word_wrap: false,
            undo_limit: 1000,
            page_overlap_lines: 1,
        }
    }
}

/// Line-number gutter layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GutterConfig {
    /// Smallest line count the width is sized for. Keeps the gutter from
    /// changing width while a file grows past 9, 99, 999... lines.
    pub digit_floor: usize,

    /// Fixed pixels added to the digit columns
    pub padding: i32,

    /// Numbers are right-aligned in at least this many columns
    pub min_number_columns: usize,

    /// Blank columns after each number
    pub trailing_columns: usize,

    pub highlight_current_line: bool,
}

impl Default for GutterConfig {
    fn default() -> Self {
        Self {
            digit_floor: 1_000_000,
            padding: 10,
            min_number_columns: 4,
            trailing_columns: 3,
            highlight_current_line: true,
        }
    }
}

/// Window and font settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Font size in pixels
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_height: f32,

    pub window_width: f32,
    pub window_height: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            line_height: 1.3,
            window_width: 1280.0,
            window_height: 800.0,
        }
    }
}

/// Colours used when painting an editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub gutter_background: Rgb,
    pub gutter_foreground: Rgb,
    /// Band behind the caret's line, across gutter and text
    pub current_line: Rgb,
    pub current_line_outline: Rgb,
    pub text_background: Rgb,
    pub text_foreground: Rgb,
    pub caret: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            gutter_background: Rgb::new(30, 30, 30),
            gutter_foreground: Rgb::new(133, 133, 133),
            current_line: Rgb::new(38, 40, 42),
            current_line_outline: Rgb::new(42, 45, 46),
            text_background: Rgb::new(30, 30, 30),
            text_foreground: Rgb::new(212, 212, 212),
            caret: Rgb::new(174, 175, 173),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gutter.digit_floor, 1_000_000);
        assert_eq!(config.gutter.padding, 10);
        assert_eq!(config.gutter.min_number_columns, 4);
        assert!(!config.editor.word_wrap);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gutter]
            digit_floor = 1000

            [languages]
            inc = "cpp"
            "#,
        )
        .unwrap();
        assert_eq!(config.gutter.digit_floor, 1000);
        assert_eq!(config.gutter.padding, 10);
        assert_eq!(config.editor.tab_size, 4);
        assert_eq!(config.languages.get("inc").map(String::as_str), Some("cpp"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.editor.word_wrap = true;
        config.colors.caret = Rgb::new(1, 2, 3);
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gutter = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
