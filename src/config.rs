use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "quillpad";
const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";
const LOG_FILE: &str = "quillpad.log";

/// Color theme for the terminal UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Persisted client preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Theme preference. `None` falls back to the terminal's ambient
    /// preference at startup.
    pub theme: Option<Theme>,
}

impl AppConfig {
    /// Load configuration from the user's config directory.
    /// Returns default config if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match config_path().map(|p| Self::load_from(&p)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("could not locate config dir, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path)
            .context("failed to read config file")
            .and_then(|c| serde_json::from_str(&c).context("failed to parse config file"))
        {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content).context("failed to write config file")?;
        Ok(())
    }

    /// The theme to render with: the stored preference, or the terminal's
    /// ambient preference when none has been saved.
    pub fn effective_theme(&self) -> Theme {
        self.theme.unwrap_or_else(ambient_theme)
    }
}

pub fn config_path() -> Result<PathBuf> {
    app_file(config_dir(), CONFIG_FILE)
}

pub fn session_path() -> Result<PathBuf> {
    app_file(config_dir(), SESSION_FILE)
}

/// TUI log destination, under the data dir so the config dir stays small.
pub fn log_path() -> Result<PathBuf> {
    app_file(data_dir(), LOG_FILE)
}

fn app_file(base: Option<PathBuf>, file: &str) -> Result<PathBuf> {
    let mut path = base.ok_or_else(|| anyhow::anyhow!("could not determine user directory"))?;
    path.push(APP_NAME);
    path.push(file);
    Ok(path)
}

/// Terminals advertise their palette through the COLORFGBG convention
/// ("fg;bg", sometimes "fg;default;bg"). Background codes 0-6 and 8 are the
/// dark palette half. Absent or unparsable, dark is assumed.
fn ambient_theme() -> Theme {
    match std::env::var("COLORFGBG") {
        Ok(value) => {
            let bg = value.rsplit(';').next().and_then(|s| s.parse::<u8>().ok());
            match bg {
                Some(7) | Some(9..=15) => Theme::Light,
                _ => Theme::Dark,
            }
        }
        Err(_) => Theme::Dark,
    }
}
