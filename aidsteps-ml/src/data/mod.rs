//! Dataset pipeline: catalog loading, expansion, splitting and quality checks.

pub mod catalog;
pub mod distribution;
pub mod example;
pub mod expand;
pub mod quality;
pub mod split;

pub use catalog::{Catalog, CatalogLoad, EmergencyRecord, Step, load_catalog, parse_catalog};
pub use distribution::{DistributionReport, classify_emergency, distribution};
pub use example::{StepList, TrainingExample, load_examples, save_examples};
pub use expand::expand;
pub use quality::{QualityReport, check_examples, check_file};
pub use split::{DatasetSplit, OverlapReport, SplitLabel, SplitPaths, split_examples, split_sizes};
