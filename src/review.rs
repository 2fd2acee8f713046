//! Optional human-in-the-loop review of approved segments.
//!
//! The pipeline consults a [`ReviewGate`] for every segment the classifier
//! approved, but only when interactive review is requested. [`AutoApprove`]
//! is the default gate and never blocks, so automated runs skip the
//! interaction entirely. [`TerminalReview`] is a blocking single-operator
//! interaction; do not run two interactive reviews against the same
//! terminal concurrently.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::artifact::ClassificationResult;

/// Number of leading lines shown in the review preview.
const PREVIEW_LINES: usize = 3;

/// Strategy object deciding whether an approved segment really becomes an
/// artifact. Returning `false` drops the segment; that drop is not counted
/// as an assembly failure.
#[async_trait]
pub trait ReviewGate: Send + Sync {
    async fn confirm(&self, result: &ClassificationResult) -> bool;
}

/// Default gate: approves everything without interaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoApprove;

#[async_trait]
impl ReviewGate for AutoApprove {
    async fn confirm(&self, _result: &ClassificationResult) -> bool {
        true
    }
}

/// Terminal gate: prints a preview of the segment, its diagnostic flags and
/// justification, then reads a single y/n answer from stdin. Anything other
/// than an explicit `n` counts as acceptance.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalReview;

#[async_trait]
impl ReviewGate for TerminalReview {
    async fn confirm(&self, result: &ClassificationResult) -> bool {
        let preview: Vec<&str> = result.text.lines().take(PREVIEW_LINES).collect();
        println!("--- Segment preview (first {PREVIEW_LINES} lines) ---");
        for line in preview {
            println!("{line}");
        }
        println!("--- End preview ---");
        println!("Diagnostic flags: {:?}", result.diagnostic_flags);
        println!("Justification: {}", result.justification);
        println!();
        println!("Accept this as an artifact? (Y/n): ");

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        // A closed or unreadable stdin counts as acceptance, same as an
        // empty answer.
        if stdin.read_line(&mut answer).await.is_err() {
            return true;
        }
        !answer.trim().eq_ignore_ascii_case("n")
    }
}
