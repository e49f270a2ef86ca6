// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Workspace or arguments could not be turned into build inputs.
    #[error("Input resolution error: {0}")]
    InputResolution(String),

    /// A launcher artifact could not be produced (link or native compile step).
    #[error("Launcher error: {0}")]
    Launcher(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunwatchError>;
