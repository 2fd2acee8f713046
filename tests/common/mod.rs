//! Shared fixtures: scripted capability fakes and builders used across the
//! integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use loreweave::artifact::{Artifact, ClassificationResult, Segment, segment_id};
use loreweave::capability::{Assembler, CapabilityError, Classifier};
use loreweave::review::ReviewGate;
use loreweave::store::{ArtifactStore, StoreError};

/// Deterministic classifier: the verdict is a pure function of the segment
/// text, so repeated runs over identical input agree.
pub struct ScriptedClassifier {
    approve: fn(&str) -> bool,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn approving_all() -> Self {
        Self::new(|_| true)
    }

    pub fn rejecting_all() -> Self {
        Self::new(|_| false)
    }

    pub fn new(approve: fn(&str) -> bool) -> Self {
        Self {
            approve,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, segment: &Segment) -> Result<ClassificationResult, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let is_artifact = (self.approve)(&segment.text);
        Ok(ClassificationResult {
            id: segment.id.clone(),
            text: segment.text.clone(),
            is_artifact,
            justification: if is_artifact {
                "self-contained and reusable".into()
            } else {
                "lacks independent meaning".into()
            },
            diagnostic_flags: vec![],
        })
    }
}

/// Classifier that sleeps before approving; used to trip the caller's
/// timeout.
pub struct SlowClassifier {
    pub delay: Duration,
}

#[async_trait]
impl Classifier for SlowClassifier {
    async fn classify(&self, segment: &Segment) -> Result<ClassificationResult, CapabilityError> {
        tokio::time::sleep(self.delay).await;
        ScriptedClassifier::approving_all().classify(segment).await
    }
}

/// Assembler that fails whenever the predicate matches the segment text.
pub struct FlakyAssembler {
    fail_when: fn(&str) -> bool,
    detected_by: &'static str,
}

impl FlakyAssembler {
    pub fn new(fail_when: fn(&str) -> bool) -> Self {
        Self {
            fail_when,
            detected_by: "scripted-contour",
        }
    }
}

#[async_trait]
impl Assembler for FlakyAssembler {
    async fn assemble(
        &self,
        approved: &ClassificationResult,
    ) -> Result<Artifact, CapabilityError> {
        if (self.fail_when)(&approved.text) {
            return Err(CapabilityError::MalformedPayload {
                stage: "assembly",
                detail: "scripted assembly failure".into(),
            });
        }
        Ok(Artifact::from_classification(approved, self.detected_by))
    }
}

/// Review gate that rejects everything and counts how often it was asked.
#[derive(Default)]
pub struct RejectingGate {
    asked: AtomicUsize,
}

impl RejectingGate {
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewGate for RejectingGate {
    async fn confirm(&self, _result: &ClassificationResult) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        false
    }
}

/// Store whose every insert fails, for the persistence-failure path.
pub struct FailingStore;

#[async_trait]
impl ArtifactStore for FailingStore {
    async fn insert_artifacts(&self, _artifacts: &[Artifact]) -> Result<usize, StoreError> {
        Err(StoreError::Backend {
            message: "scripted insert failure".into(),
        })
    }

    async fn close(&self) {}
}

/// An approved classification result over `text`.
pub fn approved_result(text: &str) -> ClassificationResult {
    ClassificationResult {
        id: segment_id(),
        text: text.into(),
        is_artifact: true,
        justification: "stands alone".into(),
        diagnostic_flags: vec!["fixture".into()],
    }
}

/// A paragraph of exactly `len` characters.
pub fn paragraph(len: usize) -> String {
    "x".repeat(len)
}
