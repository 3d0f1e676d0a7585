//! Error types for the aidsteps core library.
//!
//! Uses `thiserror` for the configuration and persistence failures that the
//! higher-level crates wrap or propagate.

use std::path::PathBuf;

/// Top-level error type for the core library.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed JSON in {} at line {line}: {message}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let err = CoreError::NotFound(PathBuf::from("processed_data/test.jsonl"));
        assert_eq!(
            err.to_string(),
            "File not found: processed_data/test.jsonl"
        );
    }

    #[test]
    fn test_malformed_line_display() {
        let err = CoreError::MalformedLine {
            path: PathBuf::from("train.jsonl"),
            line: 7,
            message: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed JSON in train.jsonl at line 7: expected value"
        );
    }

    #[test]
    fn test_config_invalid_display() {
        let err: CoreError = ConfigError::Invalid {
            field: "split.train_ratio".into(),
            message: "must be within [0, 1]".into(),
        }
        .into();
        assert!(err.to_string().contains("split.train_ratio"));
    }
}
