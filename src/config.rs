//! Viewer settings and config path resolution.
//!
//! Config directory priority:
//! 1. CLI `--config-dir`
//! 2. `ROOMVIEW_CONFIG_DIR` environment variable
//! 3. Current directory IF `roomview.json` exists there
//! 4. Platform config directory from dirs-next (`~/.config/roomview` on Linux)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::clock::DEFAULT_TICK_RATE;
use crate::entities::compositor::PREVIEW_MAX;

pub const SETTINGS_FILE: &str = "roomview.json";
pub const LOG_FILE: &str = "roomview.log";
const ENV_CONFIG_DIR: &str = "ROOMVIEW_CONFIG_DIR";

/// Overrides for default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg -> ENV var -> None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(ENV_CONFIG_DIR).ok().map(PathBuf::from));
        Self { config_dir }
    }

    pub fn config_dir(&self) -> PathBuf {
        if let Some(dir) = &self.config_dir {
            return dir.clone();
        }
        if let Ok(cwd) = std::env::current_dir() {
            if cwd.join(SETTINGS_FILE).exists() {
                return cwd;
            }
        }
        dirs_next::config_dir()
            .map(|d| d.join("roomview"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir().join(name)
    }

    pub fn ensure_dir(&self) -> Result<PathBuf> {
        let dir = self.config_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        Ok(dir)
    }
}

/// Persistent viewer settings (`roomview.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Animation clock ticks per second
    pub tick_rate: f32,
    /// Start with animation playback on
    pub playback: bool,
    /// Longest side of the preview box
    pub preview_max: f32,
    /// Base directory asset URLs resolve against when no room file dir applies
    pub asset_root: PathBuf,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            playback: false,
            preview_max: PREVIEW_MAX,
            asset_root: PathBuf::from("."),
        }
    }
}

impl ViewerSettings {
    /// Settings from the config dir, defaults if the file is absent.
    pub fn load(paths: &PathConfig) -> Result<Self> {
        Self::load_from(&paths.config_file(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, paths: &PathConfig) -> Result<PathBuf> {
        paths.ensure_dir()?;
        let path = paths.config_file(SETTINGS_FILE);
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, text).with_context(|| format!("Failed to write settings {}", path.display()))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let paths = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(paths.config_file("x.json"), PathBuf::from("/custom/x.json"));
        // CLI wins over anything else
        let paths = PathConfig::from_env_and_cli(Some(PathBuf::from("/cli")));
        assert_eq!(paths.config_dir(), PathBuf::from("/cli"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig {
            config_dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(ViewerSettings::load(&paths).unwrap(), ViewerSettings::default());
    }

    #[test]
    fn test_save_load_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig {
            config_dir: Some(dir.path().join("nested")),
        };
        let settings = ViewerSettings {
            tick_rate: 30.0,
            playback: true,
            ..Default::default()
        };
        let path = settings.save(&paths).unwrap();
        assert_eq!(ViewerSettings::load(&paths).unwrap(), settings);

        std::fs::write(&path, r#"{"preview_max": 200}"#).unwrap();
        let partial = ViewerSettings::load(&paths).unwrap();
        assert_eq!(partial.preview_max, 200.0);
        assert_eq!(partial.tick_rate, DEFAULT_TICK_RATE);
    }

    #[test]
    fn test_bad_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(ViewerSettings::load_from(&path).is_err());
    }
}
