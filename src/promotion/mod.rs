//! Caddyfile promotion sequencer.
//!
//! # Data Flow
//! ```text
//! RECEIVED → STAGED → FORMATTED → VALIDATED → BACKED_UP → PROMOTED
//!               |          |           |
//!            (fmt fail) (validate fail)
//!               ↓          ↓
//!            report {success:false, stage, output}
//! ```
//!
//! # Design Decisions
//! - Strictly ordered, no retries; a failed stage ends the request
//! - Gate rejections are data (a report), not errors
//! - Every failure happens before the live slot is touched
//! - Promotion is a rename of the staged file over the live path
//! - Applying the new config to the running proxy is left to the caller
//! - One submission at a time, enforced by a guard around the whole sequence

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::backup::{BackupStore, BackupSummary};
use crate::documents::DocumentSlot;
use crate::error::LanderError;
use crate::gate::{GateError, ValidationGate};

/// Shown to clients after a successful promotion.
pub const RELOAD_NOTICE: &str = "Caddyfile saved. Reload Caddy to apply changes.";

/// Internal progress of one submission, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionState {
    Received,
    Staged,
    Formatted,
    Validated,
    BackedUp,
    Promoted,
}

/// Stage reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStage {
    Fmt,
    Validate,
    Complete,
}

/// Result body of a Caddyfile submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionReport {
    pub success: bool,
    pub stage: ReportStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PromotionReport {
    fn rejected(stage: ReportStage, output: String) -> Self {
        Self {
            success: false,
            stage,
            output: Some(output),
            message: None,
        }
    }

    fn complete() -> Self {
        Self {
            success: true,
            stage: ReportStage::Complete,
            output: None,
            message: Some(RELOAD_NOTICE.to_string()),
        }
    }
}

/// Result body of a Caddyfile restore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreReport {
    pub status: &'static str,
    pub restart_required: bool,
}

/// Owns the live Caddyfile, its staging path and its backup history.
pub struct ConfigPromoter {
    slot: DocumentSlot,
    staging: PathBuf,
    gate: ValidationGate,
    write_guard: Mutex<()>,
}

impl ConfigPromoter {
    pub fn new(
        live: impl Into<PathBuf>,
        staging: impl Into<PathBuf>,
        backups: BackupStore,
        gate: ValidationGate,
    ) -> Self {
        Self {
            slot: DocumentSlot::new(live, backups),
            staging: staging.into(),
            gate,
            write_guard: Mutex::new(()),
        }
    }

    pub fn live_path(&self) -> &Path {
        self.slot.live_path()
    }

    /// Live Caddyfile text; empty when none has been written yet.
    pub async fn read(&self) -> Result<String, LanderError> {
        let bytes = self.slot.read_live().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Run a submission through stage, format, validate, backup, promote.
    pub async fn submit(&self, text: &str) -> Result<PromotionReport, LanderError> {
        let _guard = self.write_guard.lock().await;
        tracing::debug!(state = ?PromotionState::Received, bytes = text.len(), "Caddyfile submission");

        let formatted = match self.gate.validate_and_format(text, &self.staging).await {
            Ok(formatted) => formatted,
            Err(GateError::Format(output)) => {
                tracing::warn!(state = ?PromotionState::Staged, "Caddyfile rejected by formatter");
                return Ok(PromotionReport::rejected(ReportStage::Fmt, output));
            }
            Err(GateError::Validation(output)) => {
                tracing::warn!(state = ?PromotionState::Formatted, "Caddyfile rejected by validator");
                return Ok(PromotionReport::rejected(ReportStage::Validate, output));
            }
            Err(GateError::Staging(e)) => {
                tracing::error!(staging = %self.staging.display(), error = %e, "Failed to stage Caddyfile");
                return Err(e.into());
            }
        };
        tracing::debug!(state = ?PromotionState::Validated, bytes = formatted.text.len(), "Caddyfile accepted");

        let backup = self.slot.promote(&formatted.path).await?;
        tracing::info!(
            state = ?PromotionState::Promoted,
            live = %self.slot.live_path().display(),
            backup = backup.as_ref().map(|b| b.name.as_str()).unwrap_or("-"),
            "Caddyfile promoted"
        );

        Ok(PromotionReport::complete())
    }

    /// Put a stored backup back in the live slot. A backup was accepted once
    /// already, so it is not re-validated.
    pub async fn restore(&self, name: &str) -> Result<RestoreReport, LanderError> {
        let _guard = self.write_guard.lock().await;

        let bytes = self.slot.backups().read(name).await?;
        let backup = self.slot.replace(&bytes).await?;

        tracing::info!(
            restored = %name,
            backup = backup.as_ref().map(|b| b.name.as_str()).unwrap_or("-"),
            "Caddyfile restored"
        );
        Ok(RestoreReport {
            status: "ok",
            restart_required: true,
        })
    }

    pub async fn list_backups(&self) -> Vec<BackupSummary> {
        self.slot.backups().list().await
    }

    pub async fn fetch_backup(&self, name: &str) -> Result<Vec<u8>, LanderError> {
        self.slot.backups().read(name).await
    }
}
