//! Core error types for tasktempo-core.
//!
//! Timer and alert transitions are total and never fail. Errors only come
//! from collaborator I/O (task store, configuration file) and from
//! resolving a completion decision that is not available.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::decision::DecisionChoice;

/// Core error type for tasktempo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task collaborator errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Decision resolution errors
    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors reported by a [`TaskStore`](crate::task::TaskStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Subtask '{subtask_id}' not found on task '{task_id}'")]
    UnknownSubtask { task_id: String, subtask_id: String },

    /// Remote or local write did not go through
    #[error("Failed to update task '{id}': {message}")]
    WriteFailed { id: String, message: String },

    #[error("Task storage error: {0}")]
    Storage(String),
}

/// Errors from resolving a session-completion decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("No completion decision is pending")]
    NoPendingDecision,

    #[error("Option '{0}' was not offered for the pending decision")]
    OptionUnavailable(DecisionChoice),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
