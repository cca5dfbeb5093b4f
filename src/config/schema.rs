//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config
//! file. Every section has defaults matching the container layout, so an
//! empty file is a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Password shipped with the image; `/api/admin/info` reports when it is
/// still in use.
pub const DEFAULT_ADMIN_PASSWORD: &str = "caddyLander";

/// Root configuration for the admin service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LanderConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Request timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Locations of live documents, backups and assets.
    pub paths: PathsConfig,

    /// External caddy binary used to format and validate submissions.
    pub caddy: CaddyConfig,

    /// Backup retention.
    pub backups: BackupConfig,

    /// Admin authentication.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 90 }
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding index.html, admin.html and other assets.
    pub static_dir: PathBuf,

    /// Read-only template copied to `content` on first start.
    pub content_template: PathBuf,

    /// Live content document.
    pub content: PathBuf,

    /// Live Caddyfile.
    pub caddyfile: PathBuf,

    /// Backup directory for the Caddyfile.
    pub caddyfile_backups: PathBuf,

    /// Backup directory for the content document.
    pub content_backups: PathBuf,

    /// Fixed staging file reused by every Caddyfile submission.
    pub staging: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("/app/static"),
            content_template: PathBuf::from("/app/content/content.json"),
            content: PathBuf::from("/var/caddy/content.json"),
            caddyfile: PathBuf::from("/config/Caddyfile"),
            caddyfile_backups: PathBuf::from("/config/backup"),
            content_backups: PathBuf::from("/config/content-backup"),
            staging: PathBuf::from("/tmp/caddyfile.upload"),
        }
    }
}

/// External caddy binary settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaddyConfig {
    /// Path to the caddy executable.
    pub binary: PathBuf,

    /// Adapter passed to `caddy adapt --adapter`.
    pub adapter: String,

    /// Deadline for each external invocation in seconds.
    pub timeout_secs: u64,
}

impl Default for CaddyConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/app/vendor/caddy/caddy"),
            adapter: "caddyfile".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Backup retention settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Backups kept per document kind.
    pub retain: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retain: crate::backup::DEFAULT_RETAIN,
        }
    }
}

/// Admin authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// HTTP Basic password. Empty disables authentication.
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AdminConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
