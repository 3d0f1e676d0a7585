//! Atomic file writes and line-delimited JSON load/save.
//!
//! Every derived dataset file is produced through [`atomic_write`], so an
//! interrupted run never leaves a half-written split behind.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::Path;

use crate::error::CoreError;

/// Atomically write JSON data to a file.
///
/// Serializes `data` to pretty-printed JSON, writes to a `.tmp` sibling file,
/// then renames to the target path. Creates parent directories if they don't exist.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    atomic_write(path, json.as_bytes())
}

/// Atomically write raw bytes to a file.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Write `records` as line-delimited JSON, one compact object per line.
///
/// Returns the number of lines written.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<usize, CoreError> {
    let mut output = String::new();
    for record in records {
        output.push_str(&serde_json::to_string(record)?);
        output.push('\n');
    }
    atomic_write(path, output.as_bytes())?;
    tracing::debug!(path = %path.display(), lines = records.len(), "Wrote JSONL");
    Ok(records.len())
}

fn read_existing(path: &Path) -> Result<String, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CoreError::NotFound(path.into())),
        Err(e) => Err(e.into()),
    }
}

/// Read a line-delimited JSON file strictly.
///
/// Blank lines are skipped. The first line that fails to decode aborts the
/// read with [`CoreError::MalformedLine`].
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    let content = read_existing(path)?;
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| CoreError::MalformedLine {
            path: path.into(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// A line that could not be decoded by [`read_jsonl_lenient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

/// Read a line-delimited JSON file, collecting decode failures instead of aborting.
///
/// Each decoded record is paired with its 1-based source line. Only a missing
/// or unreadable file is an error.
pub fn read_jsonl_lenient<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<(usize, T)>, Vec<LineFailure>), CoreError> {
    let content = read_existing(path)?;
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push((idx + 1, record)),
            Err(e) => failures.push(LineFailure {
                line: idx + 1,
                message: e.to_string(),
            }),
        }
    }
    Ok((records, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        count: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "alpha".into(),
                count: 1,
            },
            Row {
                name: "beta".into(),
                count: 2,
            },
        ]
    }

    #[test]
    fn test_atomic_write_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("row.json");
        let data = rows().remove(0);

        atomic_write_json(&path, &data).unwrap();
        let loaded: Row = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, data);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dir").join("out.jsonl");
        atomic_write(&path, b"{}\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_jsonl_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");
        assert_eq!(write_jsonl(&path, &rows()).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"name":"alpha","count":1}"#, r#"{"name":"beta","count":2}"#]);

        let back: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn test_read_jsonl_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "\n{\"name\":\"a\",\"count\":3}\n   \n").unwrap();
        let back: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_read_jsonl_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jsonl");
        let err = read_jsonl::<Row>(&path).unwrap_err();
        match err {
            CoreError::NotFound(p) => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_jsonl_reports_bad_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"name\":\"a\",\"count\":3}\nnot json\n").unwrap();
        let err = read_jsonl::<Row>(&path).unwrap_err();
        assert!(matches!(err, CoreError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_read_jsonl_lenient_collects_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"name\":\"a\",\"count\":3}\n{oops\n{\"name\":\"b\",\"count\":4}\n")
            .unwrap();
        let (records, failures): (Vec<(usize, Row)>, _) = read_jsonl_lenient(&path).unwrap();
        let lines: Vec<usize> = records.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![1, 3]);
        assert_eq!(records[1].1.name, "b");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line, 2);
    }
}
