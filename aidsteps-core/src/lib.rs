//! # aidsteps-core
//!
//! Layered configuration and file persistence shared by the aidsteps
//! dataset tooling and its command-line front end.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    AidstepsConfig, DataConfig, EvaluationConfig, QualityConfig, SplitConfig, config_exists,
    load_config, load_config_with,
};
pub use error::{ConfigError, CoreError};
