//! Deterministic shuffle and train/validation/test partitioning.
//!
//! The permutation is a Fisher-Yates shuffle driven by `StdRng` seeded from
//! the configured seed, so identical input order and seed always produce
//! identical splits from the same build.

use crate::data::example::{TrainingExample, load_examples, save_examples};
use crate::error::MlError;
use aidsteps_core::SplitConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitLabel {
    Train,
    Validation,
    Test,
}

impl SplitLabel {
    pub const ALL: [SplitLabel; 3] = [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitLabel::Train => write!(f, "train"),
            SplitLabel::Validation => write!(f, "validation"),
            SplitLabel::Test => write!(f, "test"),
        }
    }
}

/// Three disjoint, ordered partitions covering every input example.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: Vec<TrainingExample>,
    pub validation: Vec<TrainingExample>,
    pub test: Vec<TrainingExample>,
}

/// Count of input phrases shared between each pair of splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    pub train_validation: usize,
    pub train_test: usize,
    pub validation_test: usize,
}

impl OverlapReport {
    pub fn is_clean(&self) -> bool {
        self.train_validation == 0 && self.train_test == 0 && self.validation_test == 0
    }
}

/// Where each split lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPaths {
    pub train: PathBuf,
    pub validation: PathBuf,
    pub test: PathBuf,
}

impl SplitPaths {
    pub fn get(&self, label: SplitLabel) -> &Path {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }
}

impl DatasetSplit {
    pub fn get(&self, label: SplitLabel) -> &[TrainingExample] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// Count input phrases appearing in more than one split.
    pub fn overlap(&self) -> OverlapReport {
        let inputs = |examples: &[TrainingExample]| -> HashSet<String> {
            examples.iter().map(|e| e.input.clone()).collect()
        };
        let train = inputs(&self.train);
        let validation = inputs(&self.validation);
        let test = inputs(&self.test);
        OverlapReport {
            train_validation: train.intersection(&validation).count(),
            train_test: train.intersection(&test).count(),
            validation_test: validation.intersection(&test).count(),
        }
    }

    pub fn is_disjoint(&self) -> bool {
        self.overlap().is_clean()
    }

    /// Persist all three splits; returns the number of lines written per split.
    pub fn write_to(&self, paths: &SplitPaths) -> Result<[usize; 3], MlError> {
        let mut written = [0; 3];
        for (slot, label) in written.iter_mut().zip(SplitLabel::ALL) {
            *slot = save_examples(paths.get(label), self.get(label))?;
            tracing::info!(split = %label, path = %paths.get(label).display(), examples = *slot, "Saved split");
        }
        Ok(written)
    }

    /// Load all three splits from disk.
    pub fn read_from(paths: &SplitPaths) -> Result<Self, MlError> {
        Ok(Self {
            train: load_examples(&paths.train)?,
            validation: load_examples(&paths.validation)?,
            test: load_examples(&paths.test)?,
        })
    }
}

/// Split boundary sizes for `total` examples: `(train, validation, test)`.
///
/// The first two use truncation; the test split takes whatever remains.
pub fn split_sizes(total: usize, config: &SplitConfig) -> (usize, usize, usize) {
    let train = ((total as f64 * config.train_ratio) as usize).min(total);
    let validation = ((total as f64 * config.validation_ratio) as usize).min(total - train);
    (train, validation, total - train - validation)
}

/// Shuffle `examples` with the configured seed, then cut into three contiguous slices.
///
/// Small inputs may leave the validation or test split empty.
pub fn split_examples(mut examples: Vec<TrainingExample>, config: &SplitConfig) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(config.seed);
    examples.shuffle(&mut rng);

    let (train_size, validation_size, test_size) = split_sizes(examples.len(), config);
    let test = examples.split_off(train_size + validation_size);
    let validation = examples.split_off(train_size);
    let train = examples;

    tracing::debug!(
        seed = config.seed,
        train = train_size,
        validation = validation_size,
        test = test_size,
        "Split dataset"
    );

    DatasetSplit {
        train,
        validation,
        test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Step;
    use pretty_assertions::assert_eq;

    fn examples(n: usize) -> Vec<TrainingExample> {
        (0..n)
            .map(|i| {
                TrainingExample::new(
                    format!("phrase {i}"),
                    vec![Step::new(1, "Call for Help", "Dial the local emergency number.")],
                )
            })
            .collect()
    }

    #[test]
    fn test_sizes_80_10_remainder() {
        let config = SplitConfig::default();
        assert_eq!(split_sizes(100, &config), (80, 10, 10));
        assert_eq!(split_sizes(233, &config), (186, 23, 24));
        assert_eq!(split_sizes(0, &config), (0, 0, 0));
    }

    #[test]
    fn test_small_inputs_may_leave_splits_empty() {
        let config = SplitConfig::default();
        assert_eq!(split_sizes(3, &config), (2, 0, 1));
        assert_eq!(split_sizes(1, &config), (0, 0, 1));

        let split = split_examples(examples(3), &config);
        assert_eq!(split.train.len(), 2);
        assert!(split.validation.is_empty());
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn test_same_seed_same_split() {
        let config = SplitConfig::default();
        let a = split_examples(examples(50), &config);
        let b = split_examples(examples(50), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_order() {
        let a = split_examples(examples(50), &SplitConfig::default());
        let b = split_examples(
            examples(50),
            &SplitConfig {
                seed: 7,
                ..SplitConfig::default()
            },
        );
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn test_partition_covers_everything_once() {
        let split = split_examples(examples(41), &SplitConfig::default());
        assert_eq!(split.total(), 41);
        assert!(split.is_disjoint());

        let mut all: Vec<String> = SplitLabel::ALL
            .iter()
            .flat_map(|l| split.get(*l).iter().map(|e| e.input.clone()))
            .collect();
        all.sort();
        let mut expected: Vec<String> = examples(41).into_iter().map(|e| e.input).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_overlap_detects_shared_phrases() {
        let step = vec![Step::new(1, "Rest", "Sit down and rest for a while.")];
        let split = DatasetSplit {
            train: vec![TrainingExample::new("a", step.clone()), TrainingExample::new("b", step.clone())],
            validation: vec![TrainingExample::new("a", step.clone())],
            test: vec![TrainingExample::new("b", step)],
        };
        assert_eq!(
            split.overlap(),
            OverlapReport {
                train_validation: 1,
                train_test: 1,
                validation_test: 0,
            }
        );
        assert!(!split.is_disjoint());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SplitPaths {
            train: dir.path().join("train.jsonl"),
            validation: dir.path().join("validation.jsonl"),
            test: dir.path().join("test.jsonl"),
        };
        let split = split_examples(examples(20), &SplitConfig::default());
        assert_eq!(split.write_to(&paths).unwrap(), [16, 2, 2]);
        assert_eq!(DatasetSplit::read_from(&paths).unwrap(), split);
    }

    #[test]
    fn test_split_label_display() {
        let names: Vec<String> = SplitLabel::ALL.iter().map(|l| l.to_string()).collect();
        assert_eq!(names, vec!["train", "validation", "test"]);
    }
}
