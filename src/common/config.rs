//! Configuration loading with environment variable support
//!
//! Values come from an optional TOML file, are then overridden by
//! `DICE10K_*` environment variables, and are validated last.

use crate::config::GameConfig;
use crate::errors::{ConfigResult, ConfigurationError};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> ConfigResult<GameConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => GameConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> ConfigResult<GameConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut GameConfig) -> ConfigResult<()> {
        if let Some(v) = env_parse("DICE10K_TARGET_SCORE")? {
            config.rules.target_score = v;
        }
        if let Some(v) = env_parse("DICE10K_OPENING_THRESHOLD")? {
            config.rules.opening_threshold = v;
        }
        if let Some(v) = env_parse("DICE10K_FOLLOW_UP_THRESHOLD")? {
            config.rules.follow_up_threshold = v;
        }
        if let Some(v) = env_parse("DICE10K_DEFAULT_BET")? {
            config.betting.default_bet = v;
        }
        if let Some(v) = env_parse("DICE10K_STARTING_BALANCE")? {
            config.betting.starting_balance = v;
        }
        if let Some(v) = env_parse("DICE10K_RESET_DELAY_MS")? {
            config.timing.reset_delay_ms = v;
        }
        if let Ok(level) = env::var("DICE10K_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &GameConfig, path: &str) -> ConfigResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)))
    }
}

fn env_parse<T: FromStr>(key: &str) -> ConfigResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidValue {
                field: key.to_string(),
                value: raw,
                reason: "Invalid number".to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> ConfigResult<()> {
    ConfigLoader::new().save(&GameConfig::default(), path)
}
