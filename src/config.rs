// src/config.rs

//! Configuration structures for the `pixview` window.
//!
//! The configuration is read from a JSON file. Every struct applies
//! `#[serde(default)]`, so a file only needs to name the settings it
//! changes. A missing file is not an error and yields the defaults.
//!
//! Lookup order for the file:
//! 1. `$PIXVIEW_CONFIG`
//! 2. `$XDG_CONFIG_HOME/pixview/config.json`
//! 3. `$HOME/.config/pixview/config.json`

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keys::{KeySymbol, Modifiers};

/// Application name, used as the default title and class hint.
pub const APP_NAME: &str = "pixview";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "PIXVIEW_CONFIG";

/// Process-wide configuration, loaded on first access.
///
/// Parse errors are logged and replaced by the defaults; use
/// [`Config::load`] directly to see them as errors.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match Config::load() {
    Ok(config) => config,
    Err(e) => {
        warn!("Failed to load configuration, using defaults: {:#}", e);
        Config::default()
    }
});

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window geometry, title and X display settings.
    pub window: WindowConfig,
    /// Colours.
    pub appearance: AppearanceConfig,
    /// Key bindings.
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Loads the configuration from the first file found in the lookup
    /// order, or the defaults if there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                debug!(
                    "No configuration file at {}; using defaults.",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                debug!("No configuration path could be determined; using defaults.");
                Ok(Self::default())
            }
        }
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str::<Config>(text).context("Invalid configuration JSON")
    }

    fn config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(explicit));
        }
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(APP_NAME).join("config.json"))
    }
}

// --- Window Configuration ---

/// Settings for the top-level window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Requested width in pixels; clamped to the screen width.
    pub width: u32,
    /// Requested height in pixels; clamped to the screen height.
    pub height: u32,
    /// Window and icon title. Empty means the application name.
    pub title: String,
    /// `res_name` of the WM_CLASS hint.
    pub res_name: String,
    /// `res_class` of the WM_CLASS hint.
    pub res_class: String,
    /// X display to connect to. `None` uses `$DISPLAY`.
    pub display: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 800,
            height: 600,
            title: APP_NAME.to_string(),
            res_name: APP_NAME.to_string(),
            res_class: APP_NAME.to_string(),
            display: None,
        }
    }
}

// --- Appearance Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Background colour outside fullscreen, as an X colour name or
    /// `#rrggbb` value. Fullscreen always uses black.
    pub background: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            background: "#888888".to_string(),
        }
    }
}

// --- Keybinding Configuration ---

/// A key and the exact modifier set that must accompany it.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct KeyCombination {
    #[serde(default)]
    pub symbol: KeySymbol,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyCombination {
    fn plain(symbol: KeySymbol) -> Self {
        KeyCombination {
            symbol,
            modifiers: Modifiers::empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub quit: Vec<KeyCombination>,
    pub toggle_fullscreen: Vec<KeyCombination>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        KeybindingsConfig {
            quit: vec![
                KeyCombination::plain(KeySymbol::Char('q')),
                KeyCombination::plain(KeySymbol::Escape),
            ],
            toggle_fullscreen: vec![
                KeyCombination::plain(KeySymbol::Char('f')),
                KeyCombination::plain(KeySymbol::F11),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn defaults_match_viewer_conventions() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, APP_NAME);
        assert_eq!(config.window.res_class, APP_NAME);
        assert!(config.window.display.is_none());
        assert_eq!(config.appearance.background, "#888888");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            Config::from_json(r#"{ "window": { "width": 1024, "title": "photos" } }"#).unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "photos");
        assert_eq!(config.keybindings, KeybindingsConfig::default());
    }

    #[test]
    fn keybindings_parse_from_json() {
        let config = Config::from_json(
            r#"{ "keybindings": { "quit": [ { "symbol": { "Char": "x" }, "modifiers": "CONTROL" } ] } }"#,
        )
        .unwrap();
        assert_eq!(
            config.keybindings.quit,
            vec![KeyCombination {
                symbol: KeySymbol::Char('x'),
                modifiers: Modifiers::CONTROL,
            }]
        );
        assert_eq!(
            config.keybindings.toggle_fullscreen,
            KeybindingsConfig::default().toggle_fullscreen
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Config::from_json("{ window: ").is_err());
        assert!(Config::from_json(r#"{ "window": { "width": "wide" } }"#).is_err());
    }

    #[test]
    fn from_file_reads_json() {
        let path = std::env::temp_dir().join(format!("pixview-config-{}.json", std::process::id()));
        std::fs::write(&path, r##"{ "appearance": { "background": "#000000" } }"##).unwrap();
        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.appearance.background, "#000000");
    }

    #[test]
    fn from_file_missing_is_an_error() {
        let path = std::env::temp_dir().join("pixview-config-does-not-exist.json");
        assert!(Config::from_file(&path).is_err());
    }
}
