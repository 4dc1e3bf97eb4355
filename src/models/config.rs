//! Configuration model.

use crate::core::border::{BorderColor, BorderMode};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Poster renamer settings.
    pub renamer: RenamerConfig,
    /// SQLite cache file.
    pub cache_path: PathBuf,
    /// Log filter directive, e.g. `debug`.
    pub log_level: Option<String>,
}

/// Poster renamer run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenamerConfig {
    /// Source poster directories, highest priority first.
    pub source_dirs: Vec<PathBuf>,
    /// Asset library root.
    pub target_dir: PathBuf,
    /// Root for untouched copies of the source posters.
    pub backup_dir: Option<PathBuf>,
    /// Use `<Title>/poster.ext` layout instead of flat files.
    pub asset_folders: bool,
    /// Apply the border transform.
    pub replace_border: bool,
    /// `remove`, `black` or `custom`.
    pub border_setting: Option<String>,
    /// Hex color for the `custom` setting.
    pub custom_color: Option<String>,
    /// Try alternate titles.
    pub match_alt: bool,
    /// Delete target files whose entity is gone.
    pub clean_assets: bool,
    /// Write the unmatched ledger.
    pub unmatched_assets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            renamer: RenamerConfig::default(),
            cache_path: dirs_config_path().join("db").join("database.db"),
            log_level: None,
        }
    }
}

impl Default for RenamerConfig {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            target_dir: PathBuf::from("assets"),
            backup_dir: Some(dirs_config_path().join("original_posters")),
            asset_folders: false,
            replace_border: false,
            border_setting: None,
            custom_color: None,
            match_alt: false,
            clean_assets: false,
            unmatched_assets: true,
        }
    }
}

impl RenamerConfig {
    /// Resolve the border settings once for the run.
    ///
    /// Invalid settings disable the transform instead of failing the run.
    pub fn border_mode(&self) -> Option<BorderMode> {
        if !self.replace_border {
            return None;
        }

        match self.resolve_border_mode() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!("Border transform disabled for this run: {}", e);
                None
            }
        }
    }

    fn resolve_border_mode(&self) -> Result<BorderMode> {
        let setting = self
            .border_setting
            .as_deref()
            .unwrap_or("remove")
            .trim()
            .to_lowercase();

        match setting.as_str() {
            "remove" => Ok(BorderMode::Remove),
            "black" => Ok(BorderMode::Paint(BorderColor::BLACK)),
            "custom" => {
                let color = self.custom_color.as_deref().unwrap_or_default();
                Ok(BorderMode::Paint(BorderColor::parse(color)?))
            }
            other => Err(crate::Error::UnknownBorderSetting(other.to_string())),
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poster_renamer")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from file.
///
/// A missing default config yields `Config::default()`; an explicitly named
/// file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(crate::Error::PathNotFound(p.display().to_string()));
            }
            p.to_path_buf()
        }
        None => default_config_path(),
    };

    if !config_path.exists() {
        tracing::debug!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}
