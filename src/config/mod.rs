//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::PointsSystem;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// League defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// Points system given to newly created seasons
    #[serde(default)]
    pub points_system: PointsSystem,

    /// Number of recent results exposed per standing
    #[serde(default = "default_form_length")]
    pub form_length: usize,

    /// Default leaderboard length
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

fn default_form_length() -> usize {
    5
}

fn default_leaderboard_size() -> usize {
    10
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            points_system: PointsSystem::default(),
            form_length: default_form_length(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub league: LeagueConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            league: LeagueConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.league.form_length == 0 {
            return Err(ConfigError::ValidationError(
                "Form length must be greater than 0".to_string(),
            ));
        }

        if self.league.leaderboard_size == 0 {
            return Err(ConfigError::ValidationError(
                "Leaderboard size must be greater than 0".to_string(),
            ));
        }

        self.league
            .points_system
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
