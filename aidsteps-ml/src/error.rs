//! Error types for the aidsteps-ml crate.

use aidsteps_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for dataset and evaluation operations.
///
/// Validation outcomes are never reported through this type; they are
/// accumulated in report structures instead.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(CoreError),
}

impl From<CoreError> for MlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(path) => Self::NotFound(path),
            CoreError::Io(e) => Self::Io(e),
            CoreError::Serialization(e) => Self::Serde(e),
            CoreError::Config(e) => Self::Config(e.to_string()),
            other => Self::Core(other),
        }
    }
}

impl MlError {
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }
}
