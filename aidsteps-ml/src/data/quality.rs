//! Dataset quality checks over raw JSONL records.
//!
//! Works on untyped `serde_json::Value`s so that structurally broken lines are
//! reported as issues rather than rejected by deserialization.

use crate::data::distribution::classify_emergency;
use crate::error::MlError;
use aidsteps_core::QualityConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Minimum number of distinct emergency types for a dataset to be considered ready.
pub const MIN_COVERED_TYPES: usize = 10;

/// Where a quality issue was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum IssueScope {
    /// A line of a JSONL file (1-based), either unparsable or holding a bad example.
    Line { line: usize },
    /// One step (0-based) of the example on a JSONL file line (1-based).
    LineStep { line: usize, step: usize },
    /// A decoded example (0-based).
    Example { example: usize },
    /// One step of a decoded example (both 0-based).
    Step { example: usize, step: usize },
}

impl IssueScope {
    /// Line or example position the issue belongs to.
    pub fn position(&self) -> usize {
        match *self {
            IssueScope::Line { line } | IssueScope::LineStep { line, .. } => line,
            IssueScope::Example { example } | IssueScope::Step { example, .. } => example,
        }
    }
}

/// A single problem found by the quality check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    #[serde(flatten)]
    pub scope: IssueScope,
    pub message: String,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            IssueScope::Line { line } => write!(f, "Line {line}: {}", self.message),
            IssueScope::LineStep { line, step } => {
                write!(f, "Line {line}, Step {step}: {}", self.message)
            }
            IssueScope::Example { example } => write!(f, "Example {example}: {}", self.message),
            IssueScope::Step { example, step } => {
                write!(f, "Example {example}, Step {step}: {}", self.message)
            }
        }
    }
}

/// Mean and range of a set of lengths or counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

impl LengthStats {
    pub fn from_samples(samples: &[usize]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let mean = samples.iter().sum::<usize>() as f64 / samples.len() as f64;
        Some(Self { mean, min, max })
    }
}

impl fmt::Display for LengthStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} (range: {}-{})", self.mean, self.min, self.max)
    }
}

/// Aggregate outcome of [`check_examples`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_examples: usize,
    /// Examples that have `input`, `output` and `output.steps`.
    pub structurally_valid: usize,
    pub issues: Vec<QualityIssue>,
    pub steps_per_example: Option<LengthStats>,
    pub title_length: Option<LengthStats>,
    pub description_length: Option<LengthStats>,
    pub unique_inputs: usize,
    /// Distinct emergency types recognised among the inputs.
    pub emergency_types: BTreeSet<String>,
}

impl QualityReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn first_issues(&self, n: usize) -> &[QualityIssue] {
        &self.issues[..n.min(self.issues.len())]
    }

    /// No issues and more than [`MIN_COVERED_TYPES`] emergency types covered.
    pub fn ready_for_fine_tuning(&self) -> bool {
        self.is_valid() && self.emergency_types.len() > MIN_COVERED_TYPES
    }
}

#[derive(Default)]
struct Collector {
    /// Positions are 1-based file lines rather than 0-based indices.
    by_line: bool,
    issues: Vec<QualityIssue>,
    step_counts: Vec<usize>,
    title_lengths: Vec<usize>,
    description_lengths: Vec<usize>,
}

impl Collector {
    fn example(&mut self, example: usize, message: impl Into<String>) {
        let scope = if self.by_line {
            IssueScope::Line { line: example }
        } else {
            IssueScope::Example { example }
        };
        self.issues.push(QualityIssue {
            scope,
            message: message.into(),
        });
    }

    fn step(&mut self, example: usize, step: usize, message: impl Into<String>) {
        let scope = if self.by_line {
            IssueScope::LineStep { line: example, step }
        } else {
            IssueScope::Step { example, step }
        };
        self.issues.push(QualityIssue {
            scope,
            message: message.into(),
        });
    }
}

/// Check decoded JSONL records against the example schema and content thresholds.
///
/// Issues are positioned by 0-based record index.
pub fn check_examples(records: &[Value], config: &QualityConfig) -> QualityReport {
    check_positioned(records.iter().enumerate(), false, config)
}

fn check_positioned<'a>(
    records: impl Iterator<Item = (usize, &'a Value)>,
    by_line: bool,
    config: &QualityConfig,
) -> QualityReport {
    let mut c = Collector {
        by_line,
        ..Collector::default()
    };
    let mut total_examples = 0;
    let mut structurally_valid = 0;
    let mut unique_inputs = BTreeSet::new();
    let mut emergency_types = BTreeSet::new();

    for (i, record) in records {
        total_examples += 1;
        if let Some(input) = record.get("input").and_then(Value::as_str) {
            unique_inputs.insert(input.to_lowercase());
            let kind = classify_emergency(input);
            if kind != "other" {
                emergency_types.insert(kind.to_string());
            }
        }

        let (Some(_), Some(output)) = (record.get("input"), record.get("output")) else {
            c.example(i, "Missing 'input' or 'output' field");
            continue;
        };
        let Some(steps) = output.get("steps") else {
            c.example(i, "Missing 'steps' in output");
            continue;
        };
        let Some(steps) = steps.as_array() else {
            c.example(i, "'steps' is not a list");
            continue;
        };
        c.step_counts.push(steps.len());

        for (j, step) in steps.iter().enumerate() {
            check_step(&mut c, config, i, j, step);
        }
        structurally_valid += 1;
    }

    tracing::debug!(
        examples = total_examples,
        issues = c.issues.len(),
        "Quality check finished"
    );

    QualityReport {
        total_examples,
        structurally_valid,
        issues: c.issues,
        steps_per_example: LengthStats::from_samples(&c.step_counts),
        title_length: LengthStats::from_samples(&c.title_lengths),
        description_length: LengthStats::from_samples(&c.description_lengths),
        unique_inputs: unique_inputs.len(),
        emergency_types,
    }
}

fn check_step(c: &mut Collector, config: &QualityConfig, i: usize, j: usize, step: &Value) {
    let (Some(number), Some(title), Some(description)) =
        (step.get("step"), step.get("title"), step.get("description"))
    else {
        c.step(i, j, "Missing required fields");
        return;
    };

    if number.as_f64() != Some((j + 1) as f64) {
        c.step(i, j, format!("Step number should be {}, got {number}", j + 1));
    }

    let (Some(title), Some(description)) = (title.as_str(), description.as_str()) else {
        c.step(i, j, "Title and description must be text");
        return;
    };

    let title_len = title.chars().count();
    let description_len = description.chars().count();
    c.title_lengths.push(title_len);
    c.description_lengths.push(description_len);

    if title.starts_with(config.generic_title_prefix.as_str()) || title_len < config.min_title_len {
        c.step(i, j, format!("Generic or too short title: '{title}'"));
    }
    if description_len < config.min_description_len {
        c.step(i, j, format!("Description too short: '{description}'"));
    }
}

/// Run the example checks over a JSONL file.
///
/// Every issue is positioned by its 1-based source line: unparsable lines and
/// bad examples as [`IssueScope::Line`], step problems as
/// [`IssueScope::LineStep`]. A missing file is [`MlError::NotFound`].
pub fn check_file(path: &Path, config: &QualityConfig) -> Result<QualityReport, MlError> {
    let (records, failures): (Vec<(usize, Value)>, _) =
        aidsteps_core::persistence::read_jsonl_lenient(path)?;
    let mut report = check_positioned(records.iter().map(|(line, v)| (*line, v)), true, config);
    report.issues.extend(failures.into_iter().map(|f| QualityIssue {
        scope: IssueScope::Line { line: f.line },
        message: format!("unparsable JSON: {}", f.message),
    }));
    report.issues.sort_by_key(|issue| issue.scope.position());
    tracing::info!(
        path = %path.display(),
        examples = report.total_examples,
        issues = report.issues.len(),
        "Checked dataset"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn good(input: &str) -> Value {
        json!({
            "input": input,
            "output": {"steps": [
                {"step": 1, "title": "Apply Direct Pressure", "description": "Press firmly on the wound with a clean cloth."},
                {"step": 2, "title": "Seek Help", "description": "Call emergency services if bleeding continues."}
            ]}
        })
    }

    #[test]
    fn test_clean_records_pass() {
        let report = check_examples(&[good("I cut myself"), good("bleeding cut")], &QualityConfig::default());
        assert!(report.is_valid());
        assert_eq!(report.total_examples, 2);
        assert_eq!(report.structurally_valid, 2);
        assert_eq!(report.unique_inputs, 2);
        let steps = report.steps_per_example.unwrap();
        assert_eq!((steps.min, steps.max), (2, 2));
        assert_eq!(report.title_length.unwrap().min, 9);
    }

    #[test]
    fn test_missing_fields_reported_per_example() {
        let records = vec![json!({"input": "x"}), json!({"input": "y", "output": {}})];
        let report = check_examples(&records, &QualityConfig::default());
        let rendered: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Example 0: Missing 'input' or 'output' field",
                "Example 1: Missing 'steps' in output",
            ]
        );
        assert_eq!(report.structurally_valid, 0);
        assert!(report.steps_per_example.is_none());
    }

    #[test]
    fn test_step_level_problems() {
        let record = json!({
            "input": "fever",
            "output": {"steps": [
                {"step": 1, "title": "Step 1", "description": "Drink plenty of fluids and rest."},
                {"step": 3, "title": "Cool", "description": "short"},
                {"step": 3, "title": "Rest"}
            ]}
        });
        let report = check_examples(&[record], &QualityConfig::default());
        let rendered: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Example 0, Step 0: Generic or too short title: 'Step 1'",
                "Example 0, Step 1: Step number should be 2, got 3",
                "Example 0, Step 1: Description too short: 'short'",
                "Example 0, Step 2: Missing required fields",
            ]
        );
        // Step-level problems do not make the example structurally invalid.
        assert_eq!(report.structurally_valid, 1);
    }

    #[test]
    fn test_non_text_title_reported() {
        let record = json!({"input": "a", "output": {"steps": [
            {"step": 1, "title": 5, "description": "A long enough description."}
        ]}});
        let report = check_examples(&[record], &QualityConfig::default());
        assert_eq!(report.issues[0].message, "Title and description must be text");
    }

    #[test]
    fn test_first_issues_truncates() {
        let records: Vec<Value> = (0..15).map(|_| json!({})).collect();
        let report = check_examples(&records, &QualityConfig::default());
        assert_eq!(report.issues.len(), 15);
        assert_eq!(report.first_issues(10).len(), 10);
        assert_eq!(report.first_issues(100).len(), 15);
    }

    #[test]
    fn test_coverage_counts_emergency_types() {
        let report = check_examples(
            &[good("I cut myself"), good("someone is choking"), good("CUT on finger")],
            &QualityConfig::default(),
        );
        assert_eq!(
            report.emergency_types.iter().cloned().collect::<Vec<_>>(),
            vec!["choking".to_string(), "cuts".to_string()]
        );
        assert!(!report.ready_for_fine_tuning());
    }

    #[test]
    fn test_check_file_reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");
        let line = serde_json::to_string(&good("I cut myself")).unwrap();
        std::fs::write(&path, format!("{line}\nnot json at all\n")).unwrap();

        let report = check_file(&path, &QualityConfig::default()).unwrap();
        assert_eq!(report.total_examples, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].scope, IssueScope::Line { line: 2 });
    }

    #[test]
    fn test_check_file_numbers_examples_by_source_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");
        let line = serde_json::to_string(&good("I cut myself")).unwrap();
        let bad_step = json!({"input": "fever", "output": {"steps": [
            {"step": 1, "title": "Step 1", "description": "Drink plenty of fluids and rest."}
        ]}});
        std::fs::write(
            &path,
            format!("{line}\nnot json\n{{\"input\":\"y\"}}\n\n{bad_step}\n"),
        )
        .unwrap();

        let report = check_file(&path, &QualityConfig::default()).unwrap();
        assert_eq!(report.total_examples, 3);
        let scopes: Vec<IssueScope> = report.issues.iter().map(|i| i.scope).collect();
        assert_eq!(
            scopes,
            vec![
                IssueScope::Line { line: 2 },
                IssueScope::Line { line: 3 },
                IssueScope::LineStep { line: 5, step: 0 },
            ]
        );
        assert!(report.issues[0].to_string().starts_with("Line 2: unparsable JSON"));
        assert_eq!(
            report.issues[1].to_string(),
            "Line 3: Missing 'input' or 'output' field"
        );
        assert_eq!(
            report.issues[2].to_string(),
            "Line 5, Step 0: Generic or too short title: 'Step 1'"
        );
    }

    #[test]
    fn test_length_stats() {
        let stats = LengthStats::from_samples(&[2, 4, 6]).unwrap();
        assert_eq!(stats.to_string(), "4.0 (range: 2-6)");
        assert!(LengthStats::from_samples(&[]).is_none());
    }
}
