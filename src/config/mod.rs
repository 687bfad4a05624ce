// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from the default file location.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest), e.g. `NUTRALINGO_SERVER__PORT=8080`
    /// 2. Config file (`path`, or `~/.nutralingo/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            // An explicitly requested file must exist
            Some(p) => File::from(p).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // Override with environment variables (prefix: NUTRALINGO_)
            .add_source(
                Environment::with_prefix("NUTRALINGO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the caches cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.llm_cache.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "llm_cache.similarity_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.llm_cache.max_entries == 0 {
            return Err(AppError::Config("llm_cache.max_entries must be at least 1".to_string()));
        }
        if self.response_cache.max_size == 0 {
            return Err(AppError::Config("response_cache.max_size must be at least 1".to_string()));
        }
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nutralingo")
            .join("config.toml")
    }
}
