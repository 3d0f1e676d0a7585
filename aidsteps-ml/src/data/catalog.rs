//! The emergency catalog: categories, trigger phrases and shared remediation steps.
//!
//! The catalog is a JSON array loaded once at startup and read-only afterwards.
//! Each element is decoded on its own so one malformed record cannot abort a run.

use crate::error::MlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One ordered instruction unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position within its sequence.
    #[serde(rename = "step")]
    pub index: u32,
    pub title: String,
    pub description: String,
}

impl Step {
    pub fn new(index: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// True when step indices are exactly `1..=len`.
pub fn steps_are_contiguous(steps: &[Step]) -> bool {
    steps
        .iter()
        .enumerate()
        .all(|(pos, step)| step.index as usize == pos + 1)
}

/// A category with the phrases that trigger it and the steps that answer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRecord {
    pub category: String,
    pub patterns: Vec<String>,
    pub steps: Vec<Step>,
}

impl EmergencyRecord {
    /// Reason this record cannot contribute examples, if any.
    fn defect(&self) -> Option<String> {
        if self.category.trim().is_empty() {
            return Some("blank category".into());
        }
        if self.patterns.is_empty() {
            return Some("no patterns".into());
        }
        if self.steps.is_empty() {
            return Some("no steps".into());
        }
        if !steps_are_contiguous(&self.steps) {
            return Some("step numbers are not 1..N".into());
        }
        None
    }
}

/// A catalog entry that was left out while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position in the source array.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub reason: String,
}

/// Per-category counts, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub steps: usize,
    pub patterns: usize,
}

/// The validated, read-only catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    records: Vec<EmergencyRecord>,
}

impl Catalog {
    pub fn new(records: Vec<EmergencyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EmergencyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of trigger phrases across all categories.
    pub fn pattern_count(&self) -> usize {
        self.records.iter().map(|r| r.patterns.len()).sum()
    }

    pub fn summary(&self) -> Vec<CategorySummary> {
        self.records
            .iter()
            .map(|r| CategorySummary {
                category: r.category.clone(),
                steps: r.steps.len(),
                patterns: r.patterns.len(),
            })
            .collect()
    }
}

/// Result of loading a catalog: the usable records plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse catalog JSON text.
///
/// The document must be a JSON array; anything else is a [`MlError::Catalog`].
/// Array elements that fail to decode or are structurally unusable are
/// skipped and reported in [`CatalogLoad::skipped`].
pub fn parse_catalog(text: &str) -> Result<CatalogLoad, MlError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| MlError::catalog(format!("catalog is not valid JSON: {e}")))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(MlError::catalog("catalog must be a JSON array of records"));
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let category = entry
            .get("category")
            .and_then(|c| c.as_str())
            .map(str::to_string);

        let mut record: EmergencyRecord = match serde_json::from_value(entry) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(index, ?category, error = %e, "Skipping undecodable catalog record");
                skipped.push(SkippedRecord {
                    index,
                    category,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        record.patterns.retain(|p| !p.trim().is_empty());

        if let Some(reason) = record.defect() {
            tracing::warn!(index, category = %record.category, %reason, "Skipping catalog record");
            skipped.push(SkippedRecord {
                index,
                category: Some(record.category),
                reason,
            });
            continue;
        }

        records.push(record);
    }

    tracing::debug!(
        records = records.len(),
        skipped = skipped.len(),
        "Parsed emergency catalog"
    );

    Ok(CatalogLoad {
        catalog: Catalog::new(records),
        skipped,
    })
}

/// Load the catalog file at `path`.
pub fn load_catalog(path: &Path) -> Result<CatalogLoad, MlError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MlError::not_found(path));
        }
        Err(e) => return Err(e.into()),
    };
    let load = parse_catalog(&text)?;
    tracing::info!(
        path = %path.display(),
        categories = load.catalog.len(),
        patterns = load.catalog.pattern_count(),
        "Loaded emergency catalog"
    );
    Ok(load)
}
