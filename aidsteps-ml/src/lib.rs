//! # aidsteps-ml: first-aid instruction datasets and model evaluation
//!
//! Turns a catalog of emergency categories into instruction-tuning examples,
//! partitions them deterministically, checks their quality, and judges what a
//! fine-tuned model generates for them.
//!
//! ## Pipeline
//!
//! 1. **Catalog** ([`data::catalog`]): categories, user phrasings and canonical steps
//! 2. **Expansion** ([`data::expand`]): one example per phrasing
//! 3. **Splitting** ([`data::split`]): seeded shuffle into train/validation/test
//! 4. **Quality** ([`data::quality`], [`data::distribution`]): dataset reports
//! 5. **Evaluation** ([`eval`], [`llm::eval_harness`]): parse, validate and score model output

pub mod error;

pub mod data;
pub mod eval;
pub mod inference;
pub mod llm;

pub use data::{Catalog, DatasetSplit, SplitLabel, TrainingExample};
pub use error::MlError;
pub use eval::{RelevanceScore, StructureChecks};
pub use inference::{GenerationOptions, InferenceClient, OllamaClient};
