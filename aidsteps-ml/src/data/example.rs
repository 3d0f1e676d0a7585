//! Training example types and their line-delimited JSON persistence.

use crate::data::catalog::Step;
use crate::error::MlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The model's expected answer: an ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepList {
    pub steps: Vec<Step>,
}

/// One (trigger phrase, steps) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub input: String,
    pub output: StepList,
}

impl TrainingExample {
    pub fn new(input: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            input: input.into(),
            output: StepList { steps },
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.output.steps
    }
}

/// Write examples to a JSONL file, one example per line.
pub fn save_examples(path: &Path, examples: &[TrainingExample]) -> Result<usize, MlError> {
    Ok(aidsteps_core::persistence::write_jsonl(path, examples)?)
}

/// Read examples from a JSONL file. A missing file is [`MlError::NotFound`].
pub fn load_examples(path: &Path) -> Result<Vec<TrainingExample>, MlError> {
    Ok(aidsteps_core::persistence::read_jsonl(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn choking() -> TrainingExample {
        TrainingExample::new(
            "someone is choking",
            vec![
                Step::new(1, "Assess the Situation", "Check if the person can speak or cough."),
                Step::new(2, "Perform Back Blows", "Give 5 sharp blows between the shoulder blades."),
            ],
        )
    }

    #[test]
    fn test_example_wire_shape() {
        let json = serde_json::to_value(choking()).unwrap();
        assert_eq!(json["input"], "someone is choking");
        assert_eq!(json["output"]["steps"][1]["step"], 2);
        assert_eq!(json["output"]["steps"][0]["title"], "Assess the Situation");
    }

    #[test]
    fn test_jsonl_roundtrip_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");
        let original = vec![
            choking(),
            TrainingExample::new(
                "émoji 🚑 and \"quotes\"",
                vec![Step::new(1, "Stay Calm", "Keep breathing slowly\nand wait for help.")],
            ),
        ];

        assert_eq!(save_examples(&path, &original).unwrap(), 2);
        let loaded = load_examples(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_examples(&dir.path().join("train.jsonl")).unwrap_err();
        assert!(matches!(err, MlError::NotFound(_)));
    }
}
