//! Evaluation harness for a served fine-tuned model.
//!
//! Each test example is turned into a prompt, sent to an [`InferenceClient`],
//! and the generated text is parsed, structurally validated and scored for
//! relevance. Failures of any kind are recorded per example; only I/O around
//! the run itself can abort it.

use crate::data::example::{StepList, TrainingExample};
use crate::error::MlError;
use crate::eval::{
    RelevanceScore, StructureChecks, parse_generated, score_relevance, validate_structure_with,
};
use crate::inference::{GenerationOptions, InferenceClient};
use crate::llm::prompt::prompt_for;
use aidsteps_core::{EvaluationConfig, QualityConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Everything learned about one generated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleEvaluation {
    pub input: String,
    pub generated_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_json: Option<Value>,
    pub is_valid_json: bool,
    /// Present only when the response held valid JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_results: Option<StructureChecks>,
    /// Present only when the JSON had a `steps` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_results: Option<RelevanceScore>,
    pub expected_output: StepList,
    /// Inference failure for this example, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Judge an already generated response for `example`.
pub fn evaluate_response(
    example: &TrainingExample,
    generated: &str,
    step_bounds: (usize, usize),
) -> ExampleEvaluation {
    let parsed = parse_generated(generated);
    let (validation_results, relevance_results) = match &parsed.json {
        Some(json) => {
            let checks = validate_structure_with(json, step_bounds.0, step_bounds.1);
            let relevance = json.get("steps").map(|steps| {
                let steps = steps.as_array().map(Vec::as_slice).unwrap_or(&[]);
                score_relevance(&example.input, steps)
            });
            (Some(checks), relevance)
        }
        None => (None, None),
    };

    ExampleEvaluation {
        input: example.input.clone(),
        generated_response: generated.to_string(),
        parsed_json: parsed.json,
        is_valid_json: parsed.is_valid_json,
        validation_results,
        relevance_results,
        expected_output: example.output.clone(),
        error: None,
    }
}

/// Pass count for one named structure check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    pub name: String,
    pub passed: usize,
}

/// Aggregate statistics over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_examples: usize,
    pub inference_errors: usize,
    pub valid_json: usize,
    pub valid_json_rate: f64,
    /// Counted over valid-JSON results only.
    pub checks: Vec<CheckTally>,
    /// Means over results that had a `steps` field; `None` when there were none.
    pub mean_specific_relevance: Option<f64>,
    pub mean_general_relevance: Option<f64>,
    pub mean_overall_relevance: Option<f64>,
    pub passed: bool,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

impl EvaluationSummary {
    pub fn from_results(results: &[ExampleEvaluation], config: &EvaluationConfig) -> Self {
        let total_examples = results.len();
        let valid: Vec<&ExampleEvaluation> = results.iter().filter(|r| r.is_valid_json).collect();
        let valid_json = valid.len();
        let valid_json_rate = if total_examples > 0 {
            valid_json as f64 / total_examples as f64
        } else {
            0.0
        };

        let checks = StructureChecks::NAMES
            .iter()
            .enumerate()
            .map(|(idx, name)| CheckTally {
                name: name.to_string(),
                passed: valid
                    .iter()
                    .filter_map(|r| r.validation_results)
                    .filter(|c| c.iter().nth(idx).is_some_and(|(_, ok)| ok))
                    .count(),
            })
            .collect();

        let scored: Vec<&RelevanceScore> = valid
            .iter()
            .filter_map(|r| r.relevance_results.as_ref())
            .collect();
        let mean_specific_relevance = mean(scored.iter().map(|s| s.specific_relevance_score));
        let mean_general_relevance = mean(scored.iter().map(|s| s.general_relevance_score));
        let mean_overall_relevance = mean(scored.iter().map(|s| s.overall_relevance));

        let passed = total_examples > 0
            && valid_json_rate >= config.min_valid_json_rate
            && mean_overall_relevance.unwrap_or(0.0) >= config.min_overall_relevance;

        Self {
            total_examples,
            inference_errors: results.iter().filter(|r| r.error.is_some()).count(),
            valid_json,
            valid_json_rate,
            checks,
            mean_specific_relevance,
            mean_general_relevance,
            mean_overall_relevance,
            passed,
        }
    }
}

/// A complete evaluation run as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub model: String,
    pub backend: String,
    pub evaluated_at: DateTime<Utc>,
    pub summary: EvaluationSummary,
    pub results: Vec<ExampleEvaluation>,
}

impl EvaluationRun {
    pub fn save(&self, path: &Path) -> Result<(), MlError> {
        aidsteps_core::persistence::atomic_write_json(path, self)?;
        tracing::info!(path = %path.display(), "Saved evaluation results");
        Ok(())
    }
}

/// Drives prompts through an inference client and judges the answers.
pub struct Evaluator<'a> {
    client: &'a dyn InferenceClient,
    options: GenerationOptions,
    step_bounds: (usize, usize),
}

impl<'a> Evaluator<'a> {
    pub fn new(client: &'a dyn InferenceClient, options: GenerationOptions) -> Self {
        let quality = QualityConfig::default();
        Self {
            client,
            options,
            step_bounds: (quality.min_step_count, quality.max_step_count),
        }
    }

    pub fn with_step_bounds(mut self, min: usize, max: usize) -> Self {
        self.step_bounds = (min, max);
        self
    }

    /// Generate and judge one example. Inference errors are recorded, not returned.
    pub async fn evaluate_example(&self, example: &TrainingExample) -> ExampleEvaluation {
        let prompt = prompt_for(&example.input);
        match self.client.generate(&prompt, &self.options).await {
            Ok(generated) => evaluate_response(example, generated.trim(), self.step_bounds),
            Err(e) => {
                tracing::warn!(input = %example.input, error = %e, "Generation failed");
                let mut evaluation = evaluate_response(example, "", self.step_bounds);
                evaluation.error = Some(e.to_string());
                evaluation
            }
        }
    }

    /// Evaluate examples one after another, in order.
    pub async fn evaluate(&self, examples: &[TrainingExample]) -> Vec<ExampleEvaluation> {
        let mut results = Vec::with_capacity(examples.len());
        for (i, example) in examples.iter().enumerate() {
            tracing::info!(
                progress = format!("{}/{}", i + 1, examples.len()),
                input = %example.input,
                "Evaluating example"
            );
            results.push(self.evaluate_example(example).await);
        }
        results
    }

    /// Evaluate and summarise into a persistable run.
    pub async fn run(
        &self,
        model: &str,
        examples: &[TrainingExample],
        config: &EvaluationConfig,
    ) -> EvaluationRun {
        let results = self.evaluate(examples).await;
        let summary = EvaluationSummary::from_results(&results, config);
        EvaluationRun {
            model: model.to_string(),
            backend: self.client.name().to_string(),
            evaluated_at: Utc::now(),
            summary,
            results,
        }
    }
}
