//! Orchestrator semantics against scripted capabilities.

use std::sync::Arc;
use std::time::Duration;

use loreweave::capability::DirectAssembler;
use loreweave::pipeline::{Pipeline, PipelineConfig, RunOptions};

mod common;
use common::*;

fn config() -> PipelineConfig {
    PipelineConfig {
        min_segment_len: 20,
        capability_timeout: Duration::from_secs(5),
        classify_concurrency: 4,
    }
}

fn three_paragraph_session() -> String {
    format!(
        "{}\n\n{}\n\n{}",
        "alpha ".repeat(5).trim(),
        "bravo ".repeat(5).trim(),
        "charlie ".repeat(5).trim()
    )
}

#[tokio::test]
async fn approved_segments_become_ordered_artifacts() {
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(DirectAssembler::default()),
        config(),
    );
    let session = three_paragraph_session();
    let run = pipeline.run(&session, RunOptions::default()).await;

    assert_eq!(run.stats.segments, 3);
    assert_eq!(run.artifacts.len(), 3);
    assert!(run.artifacts[0].content.starts_with("alpha"));
    assert!(run.artifacts[1].content.starts_with("bravo"));
    assert!(run.artifacts[2].content.starts_with("charlie"));
    assert!(run.artifacts.iter().all(|a| a.id.starts_with("know_")));
}

#[tokio::test]
async fn artifact_order_is_deterministic_under_fan_out() {
    // More segments than the concurrency bound, so completion order and
    // input order genuinely differ.
    let paragraphs: Vec<String> = (0..10).map(|i| format!("{i:02} {}", "word ".repeat(6))).collect();
    let session = paragraphs.join("\n\n");
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(DirectAssembler::default()),
        PipelineConfig {
            classify_concurrency: 3,
            ..config()
        },
    );
    let run = pipeline.run(&session, RunOptions::default()).await;
    assert_eq!(run.artifacts.len(), 10);
    for (i, artifact) in run.artifacts.iter().enumerate() {
        assert!(
            artifact.content.starts_with(&format!("{i:02}")),
            "artifact {i} out of order: {}",
            artifact.content
        );
    }
}

#[tokio::test]
async fn every_segment_is_classified_exactly_once() {
    let classifier = Arc::new(ScriptedClassifier::approving_all());
    let pipeline = Pipeline::new(
        classifier.clone(),
        Arc::new(DirectAssembler::default()),
        config(),
    );
    let session = three_paragraph_session();
    pipeline.run(&session, RunOptions::default()).await;
    assert_eq!(classifier.calls(), 3);
}

#[tokio::test]
async fn rejected_segments_produce_no_artifacts() {
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::rejecting_all()),
        Arc::new(DirectAssembler::default()),
        config(),
    );
    let run = pipeline
        .run(&three_paragraph_session(), RunOptions::default())
        .await;
    assert!(run.artifacts.is_empty());
    assert_eq!(run.stats.rejected, 3);
    assert_eq!(run.stats.assembly_failures, 0);
}

#[tokio::test]
async fn assembly_failure_drops_only_the_affected_segment() {
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(FlakyAssembler::new(|text| text.starts_with("bravo"))),
        config(),
    );
    let run = pipeline
        .run(&three_paragraph_session(), RunOptions::default())
        .await;
    assert_eq!(run.artifacts.len(), 2);
    assert_eq!(run.stats.assembly_failures, 1);
    assert!(run.artifacts[0].content.starts_with("alpha"));
    assert!(run.artifacts[1].content.starts_with("charlie"));
}

#[tokio::test]
async fn classification_timeout_is_a_capability_failure() {
    let pipeline = Pipeline::new(
        Arc::new(SlowClassifier {
            delay: Duration::from_millis(200),
        }),
        Arc::new(DirectAssembler::default()),
        PipelineConfig {
            capability_timeout: Duration::from_millis(10),
            ..config()
        },
    );
    let run = pipeline
        .run(&three_paragraph_session(), RunOptions::default())
        .await;
    assert!(run.artifacts.is_empty());
    assert_eq!(run.stats.rejected, 3);
}

#[tokio::test]
async fn review_override_drops_without_counting_as_assembly_failure() {
    let gate = Arc::new(RejectingGate::default());
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(DirectAssembler::default()),
        config(),
    )
    .with_review_gate(gate.clone());

    let run = pipeline
        .run(
            &three_paragraph_session(),
            RunOptions {
                interactive_review: true,
            },
        )
        .await;
    assert!(run.artifacts.is_empty());
    assert_eq!(run.stats.review_rejected, 3);
    assert_eq!(run.stats.assembly_failures, 0);
    assert_eq!(gate.asked(), 3);
}

#[tokio::test]
async fn review_gate_is_skipped_without_interactive_review() {
    let gate = Arc::new(RejectingGate::default());
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(DirectAssembler::default()),
        config(),
    )
    .with_review_gate(gate.clone());

    let run = pipeline
        .run(&three_paragraph_session(), RunOptions::default())
        .await;
    assert_eq!(run.artifacts.len(), 3);
    assert_eq!(gate.asked(), 0);
}

#[tokio::test]
async fn identical_input_yields_identical_content_and_trace() {
    let pipeline = Pipeline::new(
        Arc::new(ScriptedClassifier::approving_all()),
        Arc::new(DirectAssembler::default()),
        config(),
    );
    let session = three_paragraph_session();
    let first = pipeline.run(&session, RunOptions::default()).await;
    let second = pipeline.run(&session, RunOptions::default()).await;

    assert_eq!(first.artifacts.len(), second.artifacts.len());
    for (a, b) in first.artifacts.iter().zip(&second.artifacts) {
        assert_eq!(a.content, b.content);
        assert_eq!(a.epistemic_trace, b.epistemic_trace);
        // Identity and timestamps are fresh per run.
        assert_ne!(a.id, b.id);
    }
}

#[tokio::test]
async fn empty_session_runs_to_an_empty_result() {
    let classifier = Arc::new(ScriptedClassifier::approving_all());
    let pipeline = Pipeline::new(
        classifier.clone(),
        Arc::new(DirectAssembler::default()),
        config(),
    );
    let run = pipeline.run("   \n\n  ", RunOptions::default()).await;
    assert_eq!(run.stats.segments, 0);
    assert!(run.artifacts.is_empty());
    assert_eq!(classifier.calls(), 0);
}
