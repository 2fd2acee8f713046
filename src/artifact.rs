//! Core data model for the artifacting pipeline.
//!
//! Four shapes flow through a run, in order: a [`Segment`] produced by the
//! segmenter, a [`ClassificationResult`] produced by the classification
//! capability, an [`EpistemicTrace`] capturing the provenance of an approval
//! decision, and the final [`Artifact`] handed to the store gateway.
//!
//! All four serialize to the exact JSON field names used on the wire and in
//! persisted artifact files.
//!
//! # Identity
//!
//! Segment ids carry the `seg_` prefix and artifact ids the `know_` prefix,
//! both followed by a v4 UUID in simple hex. The distinct prefixes make it
//! impossible to confuse one kind of id for the other in logs or storage.
//!
//! ```
//! use loreweave::artifact::{segment_id, artifact_id};
//!
//! assert!(segment_id().starts_with("seg_"));
//! assert!(artifact_id().starts_with("know_"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix carried by every segment id.
pub const SEGMENT_ID_PREFIX: &str = "seg_";
/// Prefix carried by every artifact id.
pub const ARTIFACT_ID_PREFIX: &str = "know_";

/// Generate a fresh segment id (`seg_<uuid hex>`).
#[must_use]
pub fn segment_id() -> String {
    format!("{SEGMENT_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Generate a fresh artifact id (`know_<uuid hex>`).
#[must_use]
pub fn artifact_id() -> String {
    format!("{ARTIFACT_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// A contiguous run of one or more paragraphs cut from the session text.
///
/// `text` is always non-empty and trimmed; apart from the short-sole-segment
/// edge case it is at least the configured minimum length. The text is the
/// verbatim blank-line join of the original paragraphs, so segments can be
/// concatenated back into the source material without loss.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub text: String,
}

impl Segment {
    /// Wrap `text` in a segment with a freshly generated id.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: segment_id(),
            text: text.into(),
        }
    }
}

/// The classification capability's verdict on one segment.
///
/// Carries the segment through unchanged plus the decision. `justification`
/// is always present — on rejection it holds the rejection reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: String,
    pub text: String,
    pub is_artifact: bool,
    pub justification: String,
    #[serde(default)]
    pub diagnostic_flags: Vec<String>,
}

/// Immutable provenance record embedded in every artifact.
///
/// `detected_by` names the classification process that produced the
/// approval decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpistemicTrace {
    pub justification: String,
    pub diagnostic_flags: Vec<String>,
    pub detected_by: String,
}

/// A durable knowledge artifact: verbatim segment content plus provenance.
///
/// Created only from an approved [`ClassificationResult`], immutable once
/// created, and persisted exactly once. `content` is the segment text
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub epistemic_trace: EpistemicTrace,
}

impl Artifact {
    /// Build an artifact from an approved classification result.
    ///
    /// `detected_by` identifies the classification process for the embedded
    /// trace. The caller is responsible for only passing approved results;
    /// the assembly seam enforces that contract.
    #[must_use]
    pub fn from_classification(result: &ClassificationResult, detected_by: &str) -> Self {
        Self {
            id: artifact_id(),
            created_at: Utc::now(),
            content: result.text.clone(),
            epistemic_trace: EpistemicTrace {
                justification: result.justification.clone(),
                diagnostic_flags: result.diagnostic_flags.clone(),
                detected_by: detected_by.to_string(),
            },
        }
    }
}
