//! Ollama inference client (`/api/tags`, `/api/generate`).

use super::{GenerationOptions, InferenceClient};
use crate::error::MlError;
use aidsteps_core::EvaluationConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MlError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &EvaluationConfig) -> Result<Self, MlError> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models the server currently has.
    pub async fn list_models(&self) -> Result<Vec<String>, MlError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MlError::inference(format!(
                "Ollama tags request failed with status {}",
                response.status()
            )));
        }
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Whether `model` appears in `names`, treating an untagged name as `:latest`.
pub(crate) fn model_listed(names: &[String], model: &str) -> bool {
    let with_latest = format!("{model}:latest");
    names.iter().any(|n| n == model || *n == with_latest)
}

pub(crate) fn generate_body(model: &str, prompt: &str, options: &GenerationOptions) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
        "options": {
            "temperature": options.temperature,
            "num_predict": options.max_new_tokens,
        },
    })
}

#[async_trait]
impl InferenceClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(names) => {
                let listed = model_listed(&names, &self.model);
                if !listed {
                    tracing::warn!(model = %self.model, available = ?names, "Model not served by Ollama");
                }
                listed
            }
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, error = %e, "Ollama is not reachable");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, MlError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = generate_body(&self.model, prompt, options);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(MlError::inference(format!(
                "Ollama generate failed with status {status}: {detail}"
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .response
            .ok_or_else(|| MlError::inference("Ollama response has no 'response' field"))
    }
}
