//! Layered configuration for the `wildlife_map` binary.
//!
//! Precedence, highest first: command-line flags, environment variables
//! (`WILDLIFE_MAP_API_URL`, `WILDLIFE_MAP_CONFIG`), the TOML file, then
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use wildlife_map_heatmap::models::HeatLayerOptions;

/// Config file read when none is named explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "wildlife_map.toml";

/// Environment variable overriding `api_url`.
pub const API_URL_ENV: &str = "WILDLIFE_MAP_API_URL";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "WILDLIFE_MAP_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the sighting data provider.
    pub api_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Heat layer rendering parameters.
    pub heat_layer: HeatLayerOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 30,
            heat_layer: HeatLayerOptions::default(),
        }
    }
}

impl Config {
    /// Resolves configuration from flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read or
    /// parsed, or if an explicitly named file is missing.
    pub fn resolve(
        api_url_flag: Option<&str>,
        config_flag: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with(api_url_flag, config_flag, |name| std::env::var(name).ok())
    }

    /// [`Config::resolve`] with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::resolve`].
    pub fn resolve_with(
        api_url_flag: Option<&str>,
        config_flag: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env_path = env(CONFIG_PATH_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let mut config = match config_flag.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load(&path)?,
            None => Self::load_optional(Path::new(DEFAULT_CONFIG_FILE))?,
        };

        if let Some(url) = env(API_URL_ENV).filter(|s| !s.is_empty()) {
            log::debug!("Using {API_URL_ENV}={url}");
            config.api_url = url;
        }
        if let Some(url) = api_url_flag {
            config.api_url = url.to_string();
        }

        Ok(config)
    }

    /// Loads a config file that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads a config file if present, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::de::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
