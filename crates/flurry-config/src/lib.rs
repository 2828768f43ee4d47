//! Settings file handling for flurry.
//!
//! Settings live in `config.toml` under the platform config directory
//! (`FLURRY_CONFIG` overrides the path). A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use flurry_core::{AnimationSpeed, Bounds, ColorTheme, ConfigError, FieldConfig, ResizePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "FLURRY_CONFIG";

const CONFIG_FILE: &str = "config.toml";

/// Errors raised while reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid field settings: {0}")]
    Invalid(#[from] ConfigError),

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global animation speed.
    pub speed: AnimationSpeed,
    /// Snowflake tint.
    pub theme: ColorTheme,
    /// What to do once a resize settles.
    pub resize_policy: ResizePolicy,
    /// Quiet period before a burst of resize events is acted on.
    pub resize_quiet_ms: u64,
    /// Frame interval for the terminal host.
    pub frame_interval_ms: u64,
    /// Surface units per terminal column.
    pub cell_width: f32,
    /// Surface units per terminal row.
    pub cell_height: f32,
    /// Particle field tunables.
    pub field: FieldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: AnimationSpeed::default(),
            theme: ColorTheme::default(),
            resize_policy: ResizePolicy::default(),
            resize_quiet_ms: 250,
            frame_interval_ms: 33,
            cell_width: 8.0,
            cell_height: 16.0,
            field: FieldConfig::default(),
        }
    }
}

impl Config {
    /// Default settings file path, honouring [`CONFIG_ENV`].
    pub fn path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "flurry").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load settings from the default location.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::path().ok_or(SettingsError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Config = toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(io_err)?;

        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validate the field settings and the host-level values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()?;
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "frame_interval_ms",
                value: 0.0,
                requirement: "positive",
            });
        }
        let cell = Bounds::new(self.cell_width, self.cell_height);
        if !cell.is_usable() {
            return Err(ConfigError::InvalidValue {
                name: "cell_width/cell_height",
                value: self.cell_width.min(self.cell_height),
                requirement: "positive",
            });
        }
        Ok(())
    }

    pub fn resize_quiet_period(&self) -> Duration {
        Duration::from_millis(self.resize_quiet_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
