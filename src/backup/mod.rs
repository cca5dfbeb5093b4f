//! Backup history subsystem.
//!
//! # Data Flow
//! ```text
//! live slot bytes (before overwrite)
//!     → store.rs create_backup (write <prefix><YYYYMMDD-HHMMSS>)
//!     → prune: sort by mtime desc, delete beyond `retain`
//!
//! admin lookup by name
//!     → store.rs resolve (regular file + contained + prefix)
//!     → BackupEntry or NotFound
//! ```
//!
//! # Design Decisions
//! - One store per document kind, each with its own directory and prefix
//! - Prefix is checked on creation and again on every lookup
//! - Pruning is best-effort: a failed delete is logged, never returned
//! - Names have one-second resolution; a second backup within the same
//!   second overwrites the first (last write wins)

pub mod store;

pub use store::{BackupEntry, BackupStore, BackupSummary, Clock};

/// Default number of backups retained per document kind.
pub const DEFAULT_RETAIN: usize = 10;

/// The two document categories that keep a backup history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// The reverse-proxy configuration (Caddyfile).
    Caddyfile,
    /// The landing-page content document.
    Content,
}

impl DocumentKind {
    /// File name prefix every backup of this kind starts with.
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Caddyfile => "Caddyfile.old.",
            DocumentKind::Content => "content.json.old.",
        }
    }

    /// Short label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Caddyfile => "caddy",
            DocumentKind::Content => "content",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
