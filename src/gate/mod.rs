//! External validation gate for Caddyfile submissions.
//!
//! # Data Flow
//! ```text
//! raw text
//!     → write to staging path
//!     → ConfigValidator::format (in place)   ── fail → GateError::Format
//!     → ConfigValidator::validate            ── fail → GateError::Validation
//!     → read back formatted bytes → Formatted
//! ```
//!
//! # Design Decisions
//! - The gate owns no grammar; the external tool is the only syntax check
//! - Diagnostics are passed through verbatim
//! - A tool that times out is a validation failure, whichever stage hit it
//! - On failure the staged file is left as-is and never promoted

pub mod caddy;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

pub use caddy::CaddyCli;

/// Why an external tool refused a staged file.
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    /// The tool ran and exited non-zero; carries its diagnostic output.
    #[error("{0}")]
    Rejected(String),

    /// The tool did not finish within its deadline and was killed.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The tool could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Injectable formatter and syntax checker working on a staged file.
#[async_trait]
pub trait ConfigValidator: Send + Sync {
    /// Rewrite the file at `staged` into canonical form.
    async fn format(&self, staged: &Path) -> Result<(), ToolFailure>;

    /// Check that the (already formatted) file at `staged` is acceptable.
    async fn validate(&self, staged: &Path) -> Result<(), ToolFailure>;
}

/// Outcome of a gate run that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("format failed: {0}")]
    Format(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The staging file itself could not be written or read back.
    #[error("staging failed: {0}")]
    Staging(#[from] std::io::Error),
}

/// A staged file that passed formatting and validation.
#[derive(Debug, Clone)]
pub struct Formatted {
    pub path: PathBuf,
    pub text: Vec<u8>,
}

/// Runs a submission through formatting then validation.
#[derive(Clone)]
pub struct ValidationGate {
    validator: Arc<dyn ConfigValidator>,
}

impl ValidationGate {
    pub fn new(validator: Arc<dyn ConfigValidator>) -> Self {
        Self { validator }
    }

    /// Stage `raw` at `staging` and run both external checks on it.
    pub async fn validate_and_format(&self, raw: &str, staging: &Path) -> Result<Formatted, GateError> {
        if let Some(parent) = staging.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(staging, raw).await?;
        tracing::debug!(staging = %staging.display(), bytes = raw.len(), "Submission staged");

        if let Err(failure) = self.validator.format(staging).await {
            return Err(match failure {
                ToolFailure::TimedOut(_) => GateError::Validation(failure.to_string()),
                other => GateError::Format(other.to_string()),
            });
        }
        tracing::debug!(staging = %staging.display(), "Submission formatted");

        if let Err(failure) = self.validator.validate(staging).await {
            return Err(GateError::Validation(failure.to_string()));
        }
        tracing::debug!(staging = %staging.display(), "Submission validated");

        let text = fs::read(staging).await?;
        Ok(Formatted {
            path: staging.to_path_buf(),
            text,
        })
    }
}
