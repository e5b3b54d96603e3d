//! Configuration loading
//!
//! The configuration file is TOML. Its path comes from `SMARTFLOORS_CONFIG`,
//! which may also be set in a `.env` file. Without a path, or when the file
//! does not exist, the built-in defaults are used.

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};

use smartfloors_core::config::Config;

use crate::app_state::AppError;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "SMARTFLOORS_CONFIG";

/// Load and validate the configuration for this process
pub fn load() -> Result<Config, AppError> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_from_path(Path::new(&path)),
        Err(_) => {
            info!("{} not set, using default configuration", CONFIG_ENV);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Config, AppError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            info!("Loading configuration from {}", path.display());
            parse(&text)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(AppError::Config(format!("{}: {}", path.display(), e))),
    }
}

/// Parse TOML text; omitted keys keep their defaults
pub fn parse(text: &str) -> Result<Config, AppError> {
    let config: Config = toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
