//! Fine-tuning dataset export and evaluation of the served model.

pub mod dataset_prep;
pub mod eval_harness;
pub mod prompt;

pub use dataset_prep::{ShareGptRecord, export_sharegpt, to_sharegpt, validate_conversations};
pub use eval_harness::{
    CheckTally, EvaluationRun, EvaluationSummary, Evaluator, ExampleEvaluation, evaluate_response,
};
pub use prompt::prompt_for;
