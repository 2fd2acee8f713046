//! Offline submission path: validate artifact JSON files and insert them
//! one by one.
//!
//! Unlike the ingest endpoint's single-batch transaction, this path treats
//! every file as its own transaction: a parse error, validation failure, or
//! persistence failure affects only that file, and the batch finishes with
//! a summary of successes and failures.

use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::artifact::Artifact;
use crate::store::ArtifactStore;

/// Top-level keys every artifact JSON must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "created_at", "content", "epistemic_trace"];
/// Keys required inside `epistemic_trace`.
pub const TRACE_FIELDS: [&str; 3] = ["justification", "diagnostic_flags", "detected_by"];

/// Artifact JSON rejected before any insert was attempted.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ValidationError {
    #[error("artifact JSON must be an object")]
    NotAnObject,

    /// Named, sorted list of absent top-level keys.
    #[error("missing top-level fields: {fields}")]
    MissingFields { fields: String },

    #[error("field 'epistemic_trace' must be an object")]
    TraceNotAnObject,

    /// Named, sorted list of absent `epistemic_trace` keys.
    #[error("missing trace fields: {fields}")]
    MissingTraceFields { fields: String },
}

/// Check that `value` carries the full artifact shape.
///
/// Only presence is validated here; field types beyond the trace object are
/// the store schema's concern.
pub fn validate_artifact(value: &Value) -> Result<(), ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let mut missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(ValidationError::MissingFields {
            fields: missing.join(", "),
        });
    }

    let trace = object
        .get("epistemic_trace")
        .and_then(Value::as_object)
        .ok_or(ValidationError::TraceNotAnObject)?;
    let mut missing_trace: Vec<&str> = TRACE_FIELDS
        .iter()
        .copied()
        .filter(|key| !trace.contains_key(*key))
        .collect();
    if !missing_trace.is_empty() {
        missing_trace.sort_unstable();
        return Err(ValidationError::MissingTraceFields {
            fields: missing_trace.join(", "),
        });
    }

    Ok(())
}

/// Expand the given paths into JSON files: files are taken as-is when they
/// end in `.json`, directories are searched recursively. Anything else is
/// warned about and skipped.
#[must_use]
pub fn gather_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_json_files(path, &mut files);
        } else if is_json_file(path) {
            files.push(path.clone());
        } else {
            warn!(path = %path.display(), "skipping non-JSON path");
        }
    }
    files
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "cannot read directory");
            return;
        }
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_json_files(&path, out);
        } else if is_json_file(&path) {
            out.push(path);
        }
    }
}

fn is_json_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Outcome of one batch submission.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    /// Files whose artifact committed.
    pub inserted: usize,
    /// Per-file failure reasons, in processing order.
    pub failures: Vec<(PathBuf, String)>,
}

impl fmt::Display for SubmissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} inserted, {} failures", self.inserted, self.failures.len())
    }
}

/// Validate and insert each file, one transaction per file.
#[instrument(skip_all, fields(files = files.len()))]
pub async fn submit_files<S: ArtifactStore + ?Sized>(
    store: &S,
    files: &[PathBuf],
) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    for file in files {
        match submit_file(store, file).await {
            Ok(()) => report.inserted += 1,
            Err(reason) => {
                warn!(path = %file.display(), reason = %reason, "submission failed");
                report.failures.push((file.clone(), reason));
            }
        }
    }
    report
}

async fn submit_file<S: ArtifactStore + ?Sized>(store: &S, file: &Path) -> Result<(), String> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|err| format!("read error: {err}"))?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|err| format!("JSON parse error: {err}"))?;
    validate_artifact(&value).map_err(|err| err.to_string())?;
    let artifact: Artifact =
        serde_json::from_value(value).map_err(|err| format!("invalid artifact payload: {err}"))?;
    store
        .insert_one(&artifact)
        .await
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_artifact() -> Value {
        json!({
            "id": "know_1",
            "created_at": "2026-01-05T12:00:00Z",
            "content": "a kept idea",
            "epistemic_trace": {
                "justification": "stands alone",
                "diagnostic_flags": [],
                "detected_by": "epistemic-contour"
            }
        })
    }

    #[test]
    fn accepts_complete_artifact() {
        assert_eq!(validate_artifact(&complete_artifact()), Ok(()));
    }

    #[test]
    fn names_missing_top_level_fields() {
        let err = validate_artifact(&json!({"id": "know_1"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: "content, created_at, epistemic_trace".into()
            }
        );
    }

    #[test]
    fn names_missing_trace_fields() {
        let mut value = complete_artifact();
        value["epistemic_trace"]
            .as_object_mut()
            .unwrap()
            .remove("detected_by");
        let err = validate_artifact(&value).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingTraceFields {
                fields: "detected_by".into()
            }
        );
    }

    #[test]
    fn rejects_non_object_trace() {
        let mut value = complete_artifact();
        value["epistemic_trace"] = json!("not an object");
        assert_eq!(
            validate_artifact(&value).unwrap_err(),
            ValidationError::TraceNotAnObject
        );
    }

    #[test]
    fn rejects_non_object_payload() {
        assert_eq!(
            validate_artifact(&json!(["an", "array"])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }
}
