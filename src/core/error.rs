//! Error types for archviz

use std::path::PathBuf;
use thiserror::Error;

use crate::extract::ParseError;

/// Result type alias using archviz's Error
pub type Result<T> = std::result::Result<T, Error>;

/// archviz error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Root path not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Invalid root path (not a directory): {path}")]
    NotADirectory { path: PathBuf },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// True for errors caused by bad caller input rather than a failure
    /// inside the engine.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::RootNotFound { .. } | Self::NotADirectory { .. })
    }
}
