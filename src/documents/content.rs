//! Landing-page content document.
//!
//! The document is opaque JSON. Writes are parsed and re-serialized with
//! two-space indentation, which both normalizes formatting and rejects
//! anything that is not JSON before the live slot is touched.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::backup::{BackupStore, BackupSummary};
use crate::documents::DocumentSlot;
use crate::error::LanderError;

/// Content document store with its backup history.
pub struct ContentStore {
    slot: DocumentSlot,
    template: PathBuf,
    write_guard: Mutex<()>,
}

impl ContentStore {
    pub fn new(live: impl Into<PathBuf>, template: impl Into<PathBuf>, backups: BackupStore) -> Self {
        Self {
            slot: DocumentSlot::new(live, backups),
            template: template.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn live_path(&self) -> &Path {
        self.slot.live_path()
    }

    /// Install the bundled template if no live document exists yet.
    pub async fn bootstrap(&self) -> Result<bool, LanderError> {
        let live = self.slot.live_path();
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(live).await? {
            return Ok(false);
        }

        let bytes = fs::read(&self.template)
            .await
            .map_err(|source| LanderError::Bootstrap {
                path: self.template.display().to_string(),
                source,
            })?;
        fs::write(live, &bytes).await?;

        tracing::info!(
            template = %self.template.display(),
            live = %live.display(),
            "Content bootstrapped from template"
        );
        Ok(true)
    }

    /// Raw live bytes. A vacant slot is `NotFound`.
    pub async fn read(&self) -> Result<Vec<u8>, LanderError> {
        match fs::read(self.slot.live_path()).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LanderError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the live document with `new_bytes` after validating it.
    pub async fn submit(&self, new_bytes: &[u8]) -> Result<(), LanderError> {
        let parsed: Value = serde_json::from_slice(new_bytes).map_err(LanderError::InvalidPayload)?;
        let canonical = canonicalize(&parsed)?;

        let _guard = self.write_guard.lock().await;
        let backup = self.slot.replace(&canonical).await?;

        tracing::info!(
            bytes = canonical.len(),
            backup = backup.as_ref().map(|b| b.name.as_str()).unwrap_or("-"),
            "Content updated"
        );
        Ok(())
    }

    /// Restore a named backup, backing up the current document first so the
    /// restore itself can be undone.
    pub async fn restore(&self, name: &str) -> Result<(), LanderError> {
        let _guard = self.write_guard.lock().await;

        let bytes = self.slot.backups().read(name).await?;
        let parsed: Value = serde_json::from_slice(&bytes).map_err(|source| LanderError::CorruptBackup {
            name: name.to_string(),
            source,
        })?;
        let canonical = canonicalize(&parsed)?;

        let backup = self.slot.replace(&canonical).await?;
        tracing::info!(
            restored = %name,
            backup = backup.as_ref().map(|b| b.name.as_str()).unwrap_or("-"),
            "Content restored"
        );
        Ok(())
    }

    pub async fn list_backups(&self) -> Vec<BackupSummary> {
        self.slot.backups().list().await
    }

    pub async fn fetch_backup(&self, name: &str) -> Result<Vec<u8>, LanderError> {
        self.slot.backups().read(name).await
    }
}

fn canonicalize(value: &Value) -> Result<Vec<u8>, LanderError> {
    serde_json::to_vec_pretty(value).map_err(LanderError::InvalidPayload)
}
