//! # Loreweave: conversational text → knowledge artifacts
//!
//! Loreweave ingests raw, unstructured session text and produces durable,
//! provenance-tagged knowledge artifacts through a four-stage pipeline:
//!
//! 1. **Segmentation** — deterministic paragraph accumulation
//!    ([`segmenter`]).
//! 2. **Classification** — an external capability decides, per segment,
//!    whether it is a self-contained, reusable unit of knowledge
//!    ([`capability`]).
//! 3. **Assembly** — approved segments are wrapped with identity and an
//!    epistemic provenance trace ([`artifact`]).
//! 4. **Persistence** — one transactional bulk insert per run
//!    ([`store`]).
//!
//! The [`pipeline`] module sequences the stages and owns the
//! approve/reject decision flow, including the optional human review gate
//! in [`review`]. The offline submission path lives in [`submission`], the
//! ingest HTTP surface in [`server`], and environment configuration in
//! [`config`].
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use loreweave::capability::{DirectAssembler, HttpClassifier};
//! use loreweave::pipeline::{Pipeline, PipelineConfig, RunOptions};
//!
//! # async fn demo() {
//! let classifier = HttpClassifier::new(reqwest::Client::new(), "http://localhost:9000/classify");
//! let pipeline = Pipeline::new(
//!     Arc::new(classifier),
//!     Arc::new(DirectAssembler::default()),
//!     PipelineConfig::default(),
//! );
//! let run = pipeline.run("session text…", RunOptions::default()).await;
//! println!("{} artifacts", run.artifacts.len());
//! # }
//! ```

pub mod artifact;
pub mod capability;
pub mod config;
pub mod pipeline;
pub mod review;
pub mod segmenter;
pub mod server;
pub mod store;
pub mod submission;
