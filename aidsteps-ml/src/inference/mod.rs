//! Inference client trait and the Ollama HTTP implementation.
//!
//! The served model is an external collaborator; these clients only send a
//! prompt and hand back the raw generated text.

pub mod ollama;

use crate::error::MlError;
use aidsteps_core::EvaluationConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ollama::OllamaClient;

/// Sampling options forwarded to the model server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_new_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&EvaluationConfig::default())
    }
}

impl From<&EvaluationConfig> for GenerationOptions {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_new_tokens: config.max_new_tokens,
        }
    }
}

/// A source of generated text for a prompt.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    fn name(&self) -> &str;
    async fn is_available(&self) -> bool;
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, MlError>;
}
