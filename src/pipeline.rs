//! The pipeline orchestrator.
//!
//! Sequences one run end to end: segmentation, per-segment classification,
//! optional human review, and artifact assembly. The orchestrator owns the
//! in-memory artifact accumulator; persistence belongs to the caller (the
//! ingest endpoint hands the finished batch to the store gateway, the
//! offline CLI writes artifact files).
//!
//! # Execution model
//!
//! A run is a single task whose only suspension points are the capability
//! calls. Classification calls for different segments have no data
//! dependency on each other, so they fan out with bounded concurrency —
//! but the results are reduced back into original segment order before
//! assembly begins, keeping artifact order deterministic for a given input.
//! Every capability call is bounded by the configured timeout; a timeout is
//! a capability failure like any other and is never retried.
//!
//! # Per-segment states
//!
//! `Segmented → Classified → {Rejected | Approved} → {Assembled |
//! AssemblyFailed}`. `Rejected` (including a human review override) and
//! `AssemblyFailed` are terminal drops: the segment produces no artifact and
//! the run continues. The terminal tallies are reported in [`RunStats`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::artifact::{Artifact, ClassificationResult, Segment};
use crate::capability::{Assembler, CapabilityError, Classifier};
use crate::review::{AutoApprove, ReviewGate};
use crate::segmenter::{DEFAULT_MIN_SEGMENT_LEN, segment};

/// Tuning knobs for one pipeline instance.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Minimum segment length handed to the segmenter, in characters.
    pub min_segment_len: usize,
    /// Deadline applied to every classification and assembly call.
    pub capability_timeout: Duration,
    /// Upper bound on in-flight classification calls.
    pub classify_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_segment_len: DEFAULT_MIN_SEGMENT_LEN,
            capability_timeout: Duration::from_secs(60),
            classify_concurrency: 4,
        }
    }
}

/// Per-run options.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Present approved segments to the review gate before assembly.
    pub interactive_review: bool,
}

/// Terminal-state tallies for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Segments produced by the segmenter.
    pub segments: usize,
    /// Segments the classifier rejected, plus classification failures.
    pub rejected: usize,
    /// Approved segments a human reviewer overrode to rejection.
    pub review_rejected: usize,
    /// Approved segments whose assembly call failed.
    pub assembly_failures: usize,
}

/// The ordered artifacts of one run plus its terminal tallies.
#[derive(Clone, Debug, Default)]
pub struct PipelineRun {
    pub artifacts: Vec<Artifact>,
    pub stats: RunStats,
}

impl PipelineRun {
    /// Ids of the produced artifacts, in artifact order.
    #[must_use]
    pub fn artifact_ids(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.id.clone()).collect()
    }
}

/// Orchestrates segmentation, classification, review, and assembly.
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    assembler: Arc<dyn Assembler>,
    review: Arc<dyn ReviewGate>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline with the default (auto-approving) review gate.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        assembler: Arc<dyn Assembler>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier,
            assembler,
            review: Arc::new(AutoApprove),
            config,
        }
    }

    /// Replace the review gate consulted during interactive runs.
    #[must_use]
    pub fn with_review_gate(mut self, gate: Arc<dyn ReviewGate>) -> Self {
        self.review = gate;
        self
    }

    /// Run the pipeline over raw session text.
    ///
    /// Capability failures are segment-scoped: the affected segment is
    /// dropped and tallied in [`RunStats`], never surfaced as a run error.
    #[instrument(skip_all, fields(chars = session_text.chars().count()))]
    pub async fn run(&self, session_text: &str, options: RunOptions) -> PipelineRun {
        let segments = segment(session_text, self.config.min_segment_len);
        let mut stats = RunStats {
            segments: segments.len(),
            ..RunStats::default()
        };
        info!(segments = segments.len(), "segmented session text");

        let classified = self.classify_all(segments).await;

        let mut artifacts = Vec::new();
        for (segment, outcome) in classified {
            let result = match outcome {
                Ok(result) => result,
                Err(err) => {
                    warn!(segment = %segment.id, error = %err, "classification failed");
                    stats.rejected += 1;
                    continue;
                }
            };
            if !result.is_artifact {
                debug!(
                    segment = %result.id,
                    justification = %result.justification,
                    "segment rejected"
                );
                stats.rejected += 1;
                continue;
            }
            if options.interactive_review && !self.review.confirm(&result).await {
                info!(segment = %result.id, "reviewer overrode approval to rejection");
                stats.review_rejected += 1;
                continue;
            }
            match self.assemble_one(&result).await {
                Ok(artifact) => {
                    debug!(segment = %result.id, artifact = %artifact.id, "artifact assembled");
                    artifacts.push(artifact);
                }
                Err(err) => {
                    warn!(segment = %result.id, error = %err, "assembly failed");
                    stats.assembly_failures += 1;
                }
            }
        }

        info!(
            artifacts = artifacts.len(),
            rejected = stats.rejected,
            review_rejected = stats.review_rejected,
            assembly_failures = stats.assembly_failures,
            "pipeline run complete"
        );
        PipelineRun { artifacts, stats }
    }

    /// Service entry point: flatten conversational turns, then run with the
    /// default options (no interactive review).
    pub async fn run_turns(&self, turns: &[Value]) -> PipelineRun {
        let session_text = flatten_turns(turns);
        self.run(&session_text, RunOptions::default()).await
    }

    /// Classify every segment exactly once, fanning out up to the configured
    /// concurrency. `buffered` yields results in input order, so the output
    /// pairs are in original segment order regardless of completion order.
    async fn classify_all(
        &self,
        segments: Vec<Segment>,
    ) -> Vec<(Segment, Result<ClassificationResult, CapabilityError>)> {
        let timeout = self.config.capability_timeout;
        let concurrency = self.config.classify_concurrency.max(1);
        stream::iter(segments.into_iter().map(|segment| {
            let classifier = Arc::clone(&self.classifier);
            async move {
                let outcome =
                    match tokio::time::timeout(timeout, classifier.classify(&segment)).await {
                        Ok(result) => result,
                        Err(_) => Err(CapabilityError::Timeout {
                            stage: "classification",
                            timeout,
                        }),
                    };
                (segment, outcome)
            }
        }))
        .buffered(concurrency)
        .collect()
        .await
    }

    async fn assemble_one(
        &self,
        approved: &ClassificationResult,
    ) -> Result<Artifact, CapabilityError> {
        let timeout = self.config.capability_timeout;
        match tokio::time::timeout(timeout, self.assembler.assemble(approved)).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout {
                stage: "assembly",
                timeout,
            }),
        }
    }
}

/// Flatten conversational turns into session text, preserving turn order.
///
/// A turn that is a string is taken as-is; an object contributes its `text`
/// field, falling back to `content`; anything else is serialized whole. The
/// flattened turns are joined with blank lines, which is exactly the
/// boundary the segmenter splits on.
#[must_use]
pub fn flatten_turns(turns: &[Value]) -> String {
    let texts: Vec<String> = turns
        .iter()
        .map(|turn| match turn {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("text").or_else(|| map.get("content")) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => turn.to_string(),
            },
            other => other.to_string(),
        })
        .collect();
    texts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_prefers_text_over_content() {
        let turns = vec![
            json!("plain string"),
            json!({"text": "from text", "content": "ignored"}),
            json!({"content": "from content"}),
            json!({"speaker": "a"}),
        ];
        let flattened = flatten_turns(&turns);
        let parts: Vec<&str> = flattened.split("\n\n").collect();
        assert_eq!(parts[0], "plain string");
        assert_eq!(parts[1], "from text");
        assert_eq!(parts[2], "from content");
        assert_eq!(parts[3], r#"{"speaker":"a"}"#);
    }

    #[test]
    fn flatten_preserves_turn_order() {
        let turns = vec![json!("first"), json!("second"), json!("third")];
        assert_eq!(flatten_turns(&turns), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn flatten_of_no_turns_is_empty() {
        assert_eq!(flatten_turns(&[]), "");
    }
}
