//! Capacity-bounded backup directory for one document kind.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::fs;

use crate::backup::{DocumentKind, DEFAULT_RETAIN};
use crate::error::LanderError;

/// Timestamp suffix format of backup names (local time, one-second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Source of the local wall-clock time used to name backups.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// A stored backup, resolved to its on-disk location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Listing row returned to admin clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupSummary {
    pub name: String,
    /// Modification time in seconds since the Unix epoch.
    pub timestamp: f64,
}

struct StoredFile {
    name: String,
    path: PathBuf,
    modified: SystemTime,
}

/// Append-only backup history for a single document kind.
#[derive(Clone)]
pub struct BackupStore {
    kind: DocumentKind,
    dir: PathBuf,
    retain: usize,
    clock: Clock,
}

impl BackupStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// the first backup.
    pub fn new(kind: DocumentKind, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            dir: dir.into(),
            retain: DEFAULT_RETAIN,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Override how many backups survive pruning. Values below one are
    /// raised to one.
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain.max(1);
        self
    }

    /// Replace the wall clock used for backup names.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `previous` as a new backup, then prune the history down to
    /// `retain` entries.
    ///
    /// Only the write of the new entry decides success; prune failures are
    /// logged and swallowed.
    pub async fn create_backup(&self, previous: &[u8]) -> Result<BackupEntry, LanderError> {
        fs::create_dir_all(&self.dir).await?;

        let stamp = (self.clock)().format(TIMESTAMP_FORMAT);
        let name = format!("{}{}", self.kind.prefix(), stamp);
        let path = self.dir.join(&name);
        fs::write(&path, previous).await?;

        tracing::info!(
            kind = %self.kind,
            backup = %name,
            bytes = previous.len(),
            "Backup created"
        );

        self.prune().await;
        Ok(BackupEntry { name, path })
    }

    /// Newest-first listing, truncated to `retain`. Never errors; an
    /// unreadable or missing directory lists as empty.
    pub async fn list(&self) -> Vec<BackupSummary> {
        let entries = match self.sorted_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(kind = %self.kind, error = %e, "Failed to list backups");
                }
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .take(self.retain)
            .map(|f| BackupSummary {
                name: f.name,
                timestamp: f
                    .modified
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Resolve a client-supplied backup name.
    ///
    /// The result must be a regular file, must live inside the backup
    /// directory once symlinks and `..` are resolved, and must carry this
    /// kind's prefix. Any violation is reported as `NotFound`.
    pub async fn resolve(&self, name: &str) -> Result<BackupEntry, LanderError> {
        if name.is_empty() {
            return Err(LanderError::NotFound);
        }
        let requested = Path::new(name);
        if requested
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            tracing::warn!(kind = %self.kind, name = %name, "Rejected backup name");
            return Err(LanderError::NotFound);
        }

        let candidate = fs::canonicalize(self.dir.join(requested))
            .await
            .map_err(|_| LanderError::NotFound)?;
        let is_file = fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(LanderError::NotFound);
        }

        let root = fs::canonicalize(&self.dir)
            .await
            .map_err(|_| LanderError::NotFound)?;
        if !candidate.starts_with(&root) {
            tracing::warn!(kind = %self.kind, name = %name, "Backup resolved outside its directory");
            return Err(LanderError::NotFound);
        }

        let file_name = candidate
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(LanderError::NotFound)?;
        if !file_name.starts_with(self.kind.prefix()) {
            return Err(LanderError::NotFound);
        }

        Ok(BackupEntry {
            name: file_name.to_string(),
            path: candidate,
        })
    }

    /// Read the bytes of a named backup.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, LanderError> {
        let entry = self.resolve(name).await?;
        Ok(fs::read(&entry.path).await?)
    }

    async fn prune(&self) {
        let entries = match self.sorted_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "Backup pruning skipped");
                return;
            }
        };

        for stale in entries.into_iter().skip(self.retain) {
            match fs::remove_file(&stale.path).await {
                Ok(()) => tracing::debug!(kind = %self.kind, backup = %stale.name, "Pruned backup"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    kind = %self.kind,
                    backup = %stale.name,
                    error = %e,
                    "Failed to prune backup"
                ),
            }
        }
    }

    /// All entries carrying this kind's prefix, newest first. Equal mtimes
    /// fall back to the name, whose timestamp suffix sorts chronologically.
    async fn sorted_entries(&self) -> std::io::Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) if name.starts_with(self.kind.prefix()) => name,
                _ => continue,
            };
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            files.push(StoredFile {
                name,
                path: entry.path(),
                modified: meta.modified().unwrap_or(UNIX_EPOCH),
            });
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(files)
    }
}
