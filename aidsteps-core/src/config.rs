//! Configuration system for aidsteps.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/aidsteps/config.toml` and/or `.aidsteps/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the workspace-local configuration directory.
pub const WORKSPACE_CONFIG_DIR: &str = ".aidsteps";

/// Top-level configuration for aidsteps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AidstepsConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl AidstepsConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.split.validate()?;
        self.quality.validate()?;
        self.evaluation.validate()
    }
}

/// Locations of the catalog and every derived dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Hand-authored emergency catalog (JSON array).
    pub catalog_path: PathBuf,
    /// Directory receiving all derived files.
    pub processed_dir: PathBuf,
    pub expanded_file: String,
    pub train_file: String,
    pub validation_file: String,
    pub test_file: String,
    pub sharegpt_file: String,
    pub evaluation_results_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("data/emergency_catalog.json"),
            processed_dir: PathBuf::from("processed_data"),
            expanded_file: "complete_manual_dataset.jsonl".into(),
            train_file: "train.jsonl".into(),
            validation_file: "validation.jsonl".into(),
            test_file: "test.jsonl".into(),
            sharegpt_file: "complete_manual_dataset_sharegpt.jsonl".into(),
            evaluation_results_file: "validation_results.json".into(),
        }
    }
}

impl DataConfig {
    /// Catalog path resolved against `workspace` when relative.
    pub fn catalog(&self, workspace: &Path) -> PathBuf {
        resolve(workspace, &self.catalog_path)
    }

    /// A file inside the processed directory, resolved against `workspace`.
    pub fn processed(&self, workspace: &Path, file: &str) -> PathBuf {
        resolve(workspace, &self.processed_dir).join(file)
    }
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// Deterministic shuffle and partition settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub seed: u64,
    pub train_ratio: f64,
    pub validation_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_ratio: 0.8,
            validation_ratio: 0.1,
        }
    }
}

impl SplitConfig {
    /// Share of the examples left for the test split.
    pub fn test_ratio(&self) -> f64 {
        (1.0 - self.train_ratio - self.validation_ratio).max(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("split.train_ratio", self.train_ratio),
            ("split.validation_ratio", self.validation_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.train_ratio + self.validation_ratio > 1.0 + f64::EPSILON {
            return Err(ConfigError::Invalid {
                field: "split".into(),
                message: "train_ratio + validation_ratio exceeds 1.0".into(),
            });
        }
        Ok(())
    }
}

/// Thresholds for the dataset quality check and the step-count bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub min_title_len: usize,
    pub min_description_len: usize,
    /// Titles starting with this prefix are treated as placeholders.
    pub generic_title_prefix: String,
    pub max_reported_errors: usize,
    pub min_step_count: usize,
    pub max_step_count: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_title_len: 3,
            min_description_len: 10,
            generic_title_prefix: "Step ".into(),
            max_reported_errors: 10,
            min_step_count: 1,
            max_step_count: 10,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_step_count > self.max_step_count {
            return Err(ConfigError::Invalid {
                field: "quality.min_step_count".into(),
                message: format!(
                    "{} is greater than max_step_count {}",
                    self.min_step_count, self.max_step_count
                ),
            });
        }
        Ok(())
    }
}

/// Settings for querying a locally served model and judging its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Base URL of the Ollama-compatible server.
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_new_tokens: u32,
    pub timeout_secs: u64,
    /// Only evaluate the first N test examples when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_limit: Option<usize>,
    pub min_valid_json_rate: f64,
    pub min_overall_relevance: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "gemma-emergency-aid".into(),
            temperature: 0.3,
            max_new_tokens: 512,
            timeout_secs: 120,
            sample_limit: None,
            min_valid_json_rate: 0.8,
            min_overall_relevance: 0.7,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("evaluation.min_valid_json_rate", self.min_valid_json_rate),
            (
                "evaluation.min_overall_relevance",
                self.min_overall_relevance,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "evaluation.base_url".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "aidsteps", "aidsteps")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(WORKSPACE_CONFIG_DIR).join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `AIDSTEPS_`)
/// 3. Workspace-local config (`.aidsteps/config.toml`)
/// 4. User config (`~/.config/aidsteps/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&AidstepsConfig>,
) -> Result<AidstepsConfig, ConfigError> {
    load_config_with(workspace, None, overrides)
}

/// Like [`load_config`], with an extra TOML file merged above the workspace config.
///
/// Unlike the implicit user and workspace files, an explicitly named file must exist.
pub fn load_config_with(
    workspace: Option<&Path>,
    extra_file: Option<&Path>,
    overrides: Option<&AidstepsConfig>,
) -> Result<AidstepsConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AidstepsConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            tracing::debug!(path = %user_config.display(), "Merging user config");
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            tracing::debug!(path = %ws_config.display(), "Merging workspace config");
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(file) = extra_file {
        if !file.exists() {
            return Err(ConfigError::Invalid {
                field: "config".into(),
                message: format!("file not found: {}", file.display()),
            });
        }
        figment = figment.merge(Toml::file(file));
    }

    // AIDSTEPS_SPLIT__SEED, AIDSTEPS_EVALUATION__MODEL, etc.
    figment = figment.merge(Env::prefixed("AIDSTEPS_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: AidstepsConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Check whether any aidsteps configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

/// Render a configuration as pretty TOML.
pub fn to_toml(config: &AidstepsConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}
