//! Loreweave command line: offline runs, batch submission, and the ingest
//! service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use loreweave::capability::{Assembler, DirectAssembler, HttpAssembler, HttpClassifier};
use loreweave::config::{
    CapabilityConfig, StoreConfig, artifacts_dir, pipeline_config_from_env,
};
use loreweave::pipeline::{Pipeline, RunOptions};
use loreweave::review::TerminalReview;
use loreweave::server::{AppState, serve};
use loreweave::store::{ArtifactStore, PostgresArtifactStore};
use loreweave::submission::{gather_files, submit_files};

#[derive(Parser)]
#[command(
    name = "loreweave",
    about = "Weave conversational sessions into provenance-tagged knowledge artifacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the artifacting pipeline over a session text file and write the
    /// produced artifacts as JSON files.
    Run {
        /// Path to the session text file.
        session_file: PathBuf,
        /// Present approved segments for human review before assembly.
        #[arg(long)]
        review: bool,
    },
    /// Validate artifact JSON files and insert them into the store,
    /// one transaction per file.
    Submit {
        /// JSON files or directories containing them.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Start the ingest HTTP service.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Run {
            session_file,
            review,
        } => run_session(session_file, review).await,
        Command::Submit { inputs } => submit(inputs).await,
        Command::Serve { addr } => serve_ingest(addr).await,
    }
}

/// Build the pipeline from environment configuration: HTTP classifier, and
/// an HTTP assembler when `ASSEMBLER_URL` is set, in-process assembly
/// otherwise.
fn build_pipeline(capabilities: &CapabilityConfig) -> Result<Pipeline> {
    let client = reqwest::Client::new();
    let classifier = HttpClassifier::new(client.clone(), capabilities.classifier_url.clone());
    let assembler: Arc<dyn Assembler> = match &capabilities.assembler_url {
        Some(url) => Arc::new(HttpAssembler::new(client, url.clone())),
        None => Arc::new(DirectAssembler::default()),
    };
    let config = pipeline_config_from_env()?;
    Ok(Pipeline::new(Arc::new(classifier), assembler, config))
}

async fn run_session(session_file: PathBuf, review: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(&session_file)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("session file not found: {}", session_file.display()))?;
    println!(
        "Loaded session '{}' ({} chars)",
        session_file.display(),
        text.chars().count()
    );

    let capabilities = CapabilityConfig::from_env()?;
    let pipeline = build_pipeline(&capabilities)?.with_review_gate(Arc::new(TerminalReview));
    let run = pipeline
        .run(
            &text,
            RunOptions {
                interactive_review: review,
            },
        )
        .await;

    let out_dir = artifacts_dir();
    tokio::fs::create_dir_all(&out_dir)
        .await
        .into_diagnostic()
        .wrap_err("cannot create artifacts directory")?;
    for artifact in &run.artifacts {
        let path = out_dir.join(format!("{}.json", artifact.id));
        let body = serde_json::to_string_pretty(artifact).into_diagnostic()?;
        tokio::fs::write(&path, body).await.into_diagnostic()?;
        println!("[+] Artifact '{}' written to {}", artifact.id, path.display());
    }

    println!(
        "Pipeline completed: {} segments, {} artifacts, {} rejected, {} review-rejected, {} assembly failures.",
        run.stats.segments,
        run.artifacts.len(),
        run.stats.rejected,
        run.stats.review_rejected,
        run.stats.assembly_failures
    );
    Ok(())
}

async fn submit(inputs: Vec<PathBuf>) -> Result<()> {
    // Credentials are required before any file is touched.
    let store_config = StoreConfig::from_env()?;
    let files = gather_files(&inputs);
    if files.is_empty() {
        println!("No JSON files found to process.");
        return Ok(());
    }

    let store = PostgresArtifactStore::connect(&store_config.database_url()).await?;
    let report = submit_files(&store, &files).await;
    store.close().await;

    println!("{report}");
    for (path, reason) in &report.failures {
        println!(" - {}: {reason}", path.display());
    }
    Ok(())
}

async fn serve_ingest(addr: SocketAddr) -> Result<()> {
    let store_config = StoreConfig::from_env()?;
    let capabilities = CapabilityConfig::from_env()?;
    let pipeline = build_pipeline(&capabilities)?;
    let store = PostgresArtifactStore::connect(&store_config.database_url()).await?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        store: Arc::new(store),
    };
    serve(addr, state)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("ingest service failed on {addr}"))
}
