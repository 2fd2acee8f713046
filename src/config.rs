//! Environment configuration.
//!
//! Configuration is read once at process startup (`.env` honored via
//! `dotenvy`) into immutable values that are passed explicitly to the
//! components that need them — no ambient global state. Missing required
//! variables are collected and reported in a single [`ConfigError`], and
//! the process refuses to accept work when store credentials are absent.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::pipeline::PipelineConfig;

/// Startup configuration failure. Fatal: the process must not proceed.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigError {
    /// Named, sorted list of absent environment variables.
    #[error("missing environment configuration: {names}")]
    #[diagnostic(help("set the named variables in the environment or in .env"))]
    Missing { names: String },

    /// A variable was present but could not be parsed.
    #[error("invalid value for {name}: {detail}")]
    Invalid { name: String, detail: String },
}

/// Store credentials and connection parameters (`DB_*` variables).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl StoreConfig {
    /// Read `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`.
    /// All five are required; absent ones are named in the error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let vars = ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASSWORD"];
        let values: Vec<Option<String>> = vars.iter().map(|name| non_empty_var(name)).collect();
        let missing: Vec<&str> = vars
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing {
                names: missing.join(", "),
            });
        }
        let mut values = values.into_iter().flatten();
        Ok(Self {
            host: values.next().unwrap_or_default(),
            port: values.next().unwrap_or_default(),
            dbname: values.next().unwrap_or_default(),
            user: values.next().unwrap_or_default(),
            password: values.next().unwrap_or_default(),
        })
    }

    /// Connection URL for the sqlx pool.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

/// Endpoints for the classification and assembly capabilities.
///
/// `CLASSIFIER_URL` is required for any pipeline path. `ASSEMBLER_URL` is
/// optional: when unset, artifacts are assembled in-process by
/// [`crate::capability::DirectAssembler`].
#[derive(Clone, Debug)]
pub struct CapabilityConfig {
    pub classifier_url: String,
    pub assembler_url: Option<String>,
}

impl CapabilityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let classifier_url = non_empty_var("CLASSIFIER_URL").ok_or(ConfigError::Missing {
            names: "CLASSIFIER_URL".into(),
        })?;
        Ok(Self {
            classifier_url,
            assembler_url: non_empty_var("ASSEMBLER_URL"),
        })
    }
}

/// Directory the offline run writes artifact JSON files into.
pub const DEFAULT_ARTIFACTS_DIR: &str = "data/artifacts";

/// Where `loreweave run` writes assembled artifacts.
#[must_use]
pub fn artifacts_dir() -> PathBuf {
    dotenvy::dotenv().ok();
    non_empty_var("ARTIFACTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR))
}

/// Pipeline tuning from the environment, falling back to defaults:
/// `MIN_SEGMENT_LEN` (characters) and `CAPABILITY_TIMEOUT_SECS`.
pub fn pipeline_config_from_env() -> Result<PipelineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let mut config = PipelineConfig::default();
    if let Some(raw) = non_empty_var("MIN_SEGMENT_LEN") {
        config.min_segment_len = raw.parse().map_err(|_| ConfigError::Invalid {
            name: "MIN_SEGMENT_LEN".into(),
            detail: format!("expected an integer, got '{raw}'"),
        })?;
    }
    if let Some(raw) = non_empty_var("CAPABILITY_TIMEOUT_SECS") {
        let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
            name: "CAPABILITY_TIMEOUT_SECS".into(),
            detail: format!("expected an integer, got '{raw}'"),
        })?;
        config.capability_timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
