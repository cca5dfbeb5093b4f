//! Live document slots.
//!
//! # Data Flow
//! ```text
//! new bytes (content) / staged file (caddyfile)
//!     → DocumentSlot: read previous live bytes
//!     → previous non-empty? → BackupStore::create_backup
//!     → replace live slot (temp sibling + rename)
//! ```
//!
//! # Design Decisions
//! - A backup exists only if a non-empty prior version existed
//! - The live slot is replaced by rename so readers never see a partial file
//! - Slots do no locking of their own; callers hold the per-kind guard

pub mod content;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::backup::{BackupEntry, BackupStore};
use crate::error::LanderError;

pub use content::ContentStore;

/// One live document plus the backup history it feeds.
#[derive(Clone)]
pub struct DocumentSlot {
    live: PathBuf,
    backups: BackupStore,
}

impl DocumentSlot {
    pub fn new(live: impl Into<PathBuf>, backups: BackupStore) -> Self {
        Self {
            live: live.into(),
            backups,
        }
    }

    pub fn live_path(&self) -> &Path {
        &self.live
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Current live bytes, or an empty buffer when the slot is vacant.
    pub async fn read_live(&self) -> Result<Vec<u8>, LanderError> {
        match fs::read(&self.live).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Back up whatever is live, if anything.
    pub async fn backup_live(&self) -> Result<Option<BackupEntry>, LanderError> {
        let previous = self.read_live().await?;
        if previous.is_empty() {
            tracing::debug!(kind = %self.backups.kind(), "No previous version, skipping backup");
            return Ok(None);
        }
        self.backups.create_backup(&previous).await.map(Some)
    }

    /// Backup-then-write: snapshot the live document and replace it with
    /// `bytes`.
    pub async fn replace(&self, bytes: &[u8]) -> Result<Option<BackupEntry>, LanderError> {
        let backup = self.backup_live().await?;
        write_atomically(&self.live, bytes).await?;
        Ok(backup)
    }

    /// Backup-then-move: snapshot the live document and move `staged` over
    /// it.
    pub async fn promote(&self, staged: &Path) -> Result<Option<BackupEntry>, LanderError> {
        let backup = self.backup_live().await?;
        move_into_place(staged, &self.live).await?;
        Ok(backup)
    }
}

/// Temporary sibling of `path` used to stage an atomic replace.
fn sibling_temp(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes` without exposing a partially written file.
pub async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = sibling_temp(path);
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Move `from` over `to` by rename. When the two paths sit on different
/// filesystems the bytes are copied next to `to` first, so the final step
/// is still a same-directory rename. Any other rename error is returned
/// untouched.
pub async fn move_into_place(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                "Rename crosses filesystems, copying"
            );
            let bytes = fs::read(from).await?;
            write_atomically(to, &bytes).await?;
            // `to` is already replaced; a leftover source is only noise.
            if let Err(e) = fs::remove_file(from).await {
                tracing::warn!(from = %from.display(), error = %e, "Failed to remove moved file");
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::DocumentKind;
    use tempfile::TempDir;

    fn slot(tmp: &TempDir) -> DocumentSlot {
        DocumentSlot::new(
            tmp.path().join("live/Caddyfile"),
            BackupStore::new(DocumentKind::Caddyfile, tmp.path().join("backup")),
        )
    }

    #[tokio::test]
    async fn test_first_write_creates_no_backup() {
        let tmp = TempDir::new().unwrap();
        let slot = slot(&tmp);

        let backup = slot.replace(b"a.example {\n}\n").await.unwrap();
        assert!(backup.is_none());
        assert!(slot.backups().list().await.is_empty());
        assert_eq!(slot.read_live().await.unwrap(), b"a.example {\n}\n".to_vec());
    }

    #[tokio::test]
    async fn test_empty_previous_creates_no_backup() {
        let tmp = TempDir::new().unwrap();
        let slot = slot(&tmp);
        write_atomically(slot.live_path(), b"").await.unwrap();

        assert!(slot.replace(b"new").await.unwrap().is_none());
        assert!(slot.backups().list().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_backs_up_previous() {
        let tmp = TempDir::new().unwrap();
        let slot = slot(&tmp);
        slot.replace(b"first").await.unwrap();

        let backup = slot.replace(b"second").await.unwrap().expect("backup");
        assert_eq!(std::fs::read(&backup.path).unwrap(), b"first".to_vec());
        assert_eq!(slot.read_live().await.unwrap(), b"second".to_vec());
    }

    #[tokio::test]
    async fn test_promote_moves_staged_file() {
        let tmp = TempDir::new().unwrap();
        let slot = slot(&tmp);
        let staged = tmp.path().join("staged");
        std::fs::write(&staged, "b.example {\n}\n").unwrap();

        slot.promote(&staged).await.unwrap();
        assert!(!staged.exists());
        assert_eq!(slot.read_live().await.unwrap(), b"b.example {\n}\n".to_vec());
    }

    #[tokio::test]
    async fn test_failed_move_leaves_target_untouched() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("live/Caddyfile");
        write_atomically(&target, b"live").await.unwrap();

        let err = move_into_place(&tmp.path().join("missing"), &target)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(std::fs::read(&target).unwrap(), b"live".to_vec());
        let names: Vec<_> = std::fs::read_dir(tmp.path().join("live"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("Caddyfile")]);
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("content.json");
        write_atomically(&target, b"{}").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("content.json")]);
    }
}
