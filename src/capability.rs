//! Classification and assembly capability seams.
//!
//! The orchestrator never talks to a concrete decision service directly; it
//! consumes the [`Classifier`] and [`Assembler`] traits. Production wires in
//! the HTTP shims ([`HttpClassifier`], [`HttpAssembler`]) which exchange the
//! wire shapes from [`crate::artifact`] as JSON. Tests substitute scripted
//! fakes, and [`DirectAssembler`] builds artifacts in-process for
//! deployments without a standalone assembly service.
//!
//! Timeouts are imposed by the caller (the pipeline wraps every call in
//! `tokio::time::timeout`); a timed-out call surfaces as
//! [`CapabilityError::Timeout`] and is treated like any other capability
//! failure — no automatic retry.

use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::artifact::{Artifact, ClassificationResult, Segment};

/// `detected_by` value recorded by [`DirectAssembler`] unless overridden.
pub const DEFAULT_DETECTOR: &str = "epistemic-contour";

/// Failures at the classification/assembly boundary.
///
/// All variants are segment-scoped: the affected segment produces no
/// artifact and the run continues with the remaining segments.
#[derive(Debug, Error, Diagnostic)]
pub enum CapabilityError {
    /// The underlying HTTP call failed before a response was produced.
    #[error("{stage} call failed: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The capability did not answer within the caller's deadline.
    #[error("{stage} call timed out after {timeout:?}")]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },

    /// The capability answered with a non-success status code.
    #[error("{stage} returned status {status}")]
    Status {
        stage: &'static str,
        status: reqwest::StatusCode,
    },

    /// The capability's output did not match the expected shape.
    #[error("{stage} returned a malformed payload: {detail}")]
    MalformedPayload {
        stage: &'static str,
        detail: String,
    },
}

/// Decision service: is this segment a self-contained knowledge artifact?
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, segment: &Segment) -> Result<ClassificationResult, CapabilityError>;
}

/// Wraps an approved classification result into a finalized artifact.
#[async_trait]
pub trait Assembler: Send + Sync {
    async fn assemble(&self, approved: &ClassificationResult)
    -> Result<Artifact, CapabilityError>;
}

/// HTTP-backed classifier: POSTs one segment as JSON, expects a
/// [`ClassificationResult`] back.
///
/// The service may answer with a single object or with an array of results;
/// in the array form the first element is taken and an empty array is a
/// malformed payload.
#[derive(Clone, Debug)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, segment: &Segment) -> Result<ClassificationResult, CapabilityError> {
        let value = post_json(&self.client, &self.endpoint, "classification", segment).await?;
        let value = match value {
            Value::Array(mut items) => {
                if items.is_empty() {
                    return Err(CapabilityError::MalformedPayload {
                        stage: "classification",
                        detail: "empty result array".into(),
                    });
                }
                items.remove(0)
            }
            other => other,
        };
        serde_json::from_value(value).map_err(|err| CapabilityError::MalformedPayload {
            stage: "classification",
            detail: err.to_string(),
        })
    }
}

/// HTTP-backed assembler: POSTs one approved classification result as JSON,
/// expects an [`Artifact`] back.
#[derive(Clone, Debug)]
pub struct HttpAssembler {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAssembler {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Assembler for HttpAssembler {
    async fn assemble(
        &self,
        approved: &ClassificationResult,
    ) -> Result<Artifact, CapabilityError> {
        let value = post_json(&self.client, &self.endpoint, "assembly", approved).await?;
        serde_json::from_value(value).map_err(|err| CapabilityError::MalformedPayload {
            stage: "assembly",
            detail: err.to_string(),
        })
    }
}

/// In-process assembler: stamps a fresh artifact id and timestamp and embeds
/// the provenance trace, with no external call.
///
/// Rejects unapproved input instead of silently wrapping it.
#[derive(Clone, Debug)]
pub struct DirectAssembler {
    detected_by: String,
}

impl Default for DirectAssembler {
    fn default() -> Self {
        Self {
            detected_by: DEFAULT_DETECTOR.to_string(),
        }
    }
}

impl DirectAssembler {
    #[must_use]
    pub fn new(detected_by: impl Into<String>) -> Self {
        Self {
            detected_by: detected_by.into(),
        }
    }
}

#[async_trait]
impl Assembler for DirectAssembler {
    async fn assemble(
        &self,
        approved: &ClassificationResult,
    ) -> Result<Artifact, CapabilityError> {
        if !approved.is_artifact {
            return Err(CapabilityError::MalformedPayload {
                stage: "assembly",
                detail: format!("segment {} is not approved for artifacting", approved.id),
            });
        }
        Ok(Artifact::from_classification(approved, &self.detected_by))
    }
}

async fn post_json<T: serde::Serialize + Sync>(
    client: &reqwest::Client,
    endpoint: &str,
    stage: &'static str,
    body: &T,
) -> Result<Value, CapabilityError> {
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|source| CapabilityError::Transport { stage, source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(CapabilityError::Status { stage, status });
    }
    response
        .json::<Value>()
        .await
        .map_err(|err| CapabilityError::MalformedPayload {
            stage,
            detail: err.to_string(),
        })
}
