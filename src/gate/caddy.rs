//! `caddy` binary as the formatter and validator.
//!
//! Runs `<bin> fmt --overwrite <path>` and
//! `<bin> adapt --adapter <kind> --config <path>`, each bounded by a
//! timeout. The child is killed if the deadline passes.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::CaddyConfig;
use crate::gate::{ConfigValidator, ToolFailure};

/// Validator backed by the caddy command-line tool.
#[derive(Debug, Clone)]
pub struct CaddyCli {
    binary: PathBuf,
    adapter: String,
    timeout: Duration,
}

impl CaddyCli {
    pub fn new(binary: impl Into<PathBuf>, adapter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            adapter: adapter.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CaddyConfig) -> Self {
        Self::new(
            &config.binary,
            config.adapter.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn run(&self, args: &[&OsStr]) -> Result<(), ToolFailure> {
        let program = self.binary.display().to_string();
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolFailure::Spawn {
                program: program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolFailure::Spawn { program, source })?,
            Err(_) => {
                tracing::warn!(program = %self.binary.display(), timeout = ?self.timeout, "External tool timed out");
                return Err(ToolFailure::TimedOut(self.timeout));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            tracing::debug!(
                program = %self.binary.display(),
                status = %output.status,
                "External tool rejected submission"
            );
            Err(ToolFailure::Rejected(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}

#[async_trait]
impl ConfigValidator for CaddyCli {
    async fn format(&self, staged: &Path) -> Result<(), ToolFailure> {
        self.run(&[OsStr::new("fmt"), OsStr::new("--overwrite"), staged.as_os_str()])
            .await
    }

    async fn validate(&self, staged: &Path) -> Result<(), ToolFailure> {
        self.run(&[
            OsStr::new("adapt"),
            OsStr::new("--adapter"),
            OsStr::new(&self.adapter),
            OsStr::new("--config"),
            staged.as_os_str(),
        ])
        .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_caddy(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("caddy");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    #[serial]
    async fn test_fmt_invocation_rewrites_file() {
        let tmp = TempDir::new().unwrap();
        // Records its arguments, then rewrites the target like `caddy fmt --overwrite`.
        let bin = fake_caddy(
            tmp.path(),
            &format!(
                "echo \"$@\" > {log}\nprintf 'formatted\\n' > \"$3\"",
                log = tmp.path().join("args").display()
            ),
        );
        let staged = tmp.path().join("upload");
        std::fs::write(&staged, "raw").unwrap();

        let cli = CaddyCli::new(&bin, "caddyfile", Duration::from_secs(5));
        cli.format(&staged).await.unwrap();

        assert_eq!(std::fs::read_to_string(&staged).unwrap(), "formatted\n");
        let args = std::fs::read_to_string(tmp.path().join("args")).unwrap();
        assert_eq!(args.trim(), format!("fmt --overwrite {}", staged.display()));
    }

    #[tokio::test]
    #[serial]
    async fn test_adapt_invocation_passes_adapter() {
        let tmp = TempDir::new().unwrap();
        let bin = fake_caddy(
            tmp.path(),
            &format!("echo \"$@\" > {}", tmp.path().join("args").display()),
        );
        let staged = tmp.path().join("upload");
        std::fs::write(&staged, "a.example\n").unwrap();

        let cli = CaddyCli::new(&bin, "caddyfile", Duration::from_secs(5));
        cli.validate(&staged).await.unwrap();

        let args = std::fs::read_to_string(tmp.path().join("args")).unwrap();
        assert_eq!(
            args.trim(),
            format!("adapt --adapter caddyfile --config {}", staged.display())
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_nonzero_exit_returns_stderr_verbatim() {
        let tmp = TempDir::new().unwrap();
        let bin = fake_caddy(
            tmp.path(),
            "echo 'Error: Caddyfile:2: unrecognized directive: revers_proxy' >&2\nexit 1",
        );
        let cli = CaddyCli::new(&bin, "caddyfile", Duration::from_secs(5));

        match cli.validate(&tmp.path().join("upload")).await {
            Err(ToolFailure::Rejected(diag)) => assert_eq!(
                diag,
                "Error: Caddyfile:2: unrecognized directive: revers_proxy\n"
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_hung_tool_times_out() {
        let tmp = TempDir::new().unwrap();
        let bin = fake_caddy(tmp.path(), "exec sleep 10");
        let cli = CaddyCli::new(&bin, "caddyfile", Duration::from_millis(200));

        let started = std::time::Instant::now();
        let result = cli.format(&tmp.path().join("upload")).await;
        assert!(matches!(result, Err(ToolFailure::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_binary_is_spawn_failure() {
        let tmp = TempDir::new().unwrap();
        let cli = CaddyCli::new(tmp.path().join("nope"), "caddyfile", Duration::from_secs(1));
        assert!(matches!(
            cli.format(&tmp.path().join("upload")).await,
            Err(ToolFailure::Spawn { .. })
        ));
    }
}
