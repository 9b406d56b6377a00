mod config;
mod task_file;

pub use config::{AlertConfig, Config, SettingsSource, SharedSettings, TimerConfig};
pub use task_file::FileTaskStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/tasktempo[-dev]/` based on TASKTEMPO_ENV.
///
/// Set TASKTEMPO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKTEMPO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tasktempo-dev")
    } else {
        base_dir.join("tasktempo")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
