//! Path resolution utilities.

use crate::env::{self, vars};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the ChatVault base directory (`~/.chatvault`, or `$CHATVAULT_HOME`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(vars::CHATVAULT_HOME) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".chatvault"))
}

/// Get the main config file path (`~/.chatvault/chatvault.json5`, or `$CHATVAULT_CONFIG`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::get_var(vars::CHATVAULT_CONFIG) {
        return Ok(expand_tilde(&path));
    }
    Ok(base_dir()?.join("chatvault.json5"))
}

/// Get the default history file path (`~/.chatvault/history.json`).
pub fn history_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("history.json"))
}

/// Get the local embedding model cache (`~/.chatvault/models`).
pub fn models_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("models"))
}

/// Ensure all required directories exist.
pub fn ensure_dirs() -> Result<(), ConfigError> {
    for dir in [base_dir()?, models_dir()?] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
