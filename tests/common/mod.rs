//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use caddy_lander::config::LanderConfig;
use caddy_lander::gate::{ConfigValidator, ToolFailure};
use caddy_lander::http::{AppState, HttpServer};
use caddy_lander::lifecycle::{startup, Shutdown};
use tempfile::TempDir;

pub const PASSWORD: &str = "test-password";

/// Stand-in for the caddy binary.
///
/// Formatting converts four-space indents to tabs. Files containing
/// `FMT_ERROR` fail formatting, files containing `bogus_directive` fail
/// validation, files containing `SLOW` time out. Files containing `SLEEPY`
/// pass, but validation takes two seconds.
#[derive(Default)]
pub struct FakeValidator {
    pub format_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
}

#[async_trait]
impl ConfigValidator for FakeValidator {
    async fn format(&self, staged: &Path) -> Result<(), ToolFailure> {
        self.format_calls.fetch_add(1, Ordering::SeqCst);
        let text = tokio::fs::read_to_string(staged).await.unwrap();
        if text.contains("FMT_ERROR") {
            return Err(ToolFailure::Rejected(
                "Error: Caddyfile:1: unexpected token".to_string(),
            ));
        }
        if text.contains("SLOW") {
            return Err(ToolFailure::TimedOut(Duration::from_secs(30)));
        }
        tokio::fs::write(staged, text.replace("    ", "\t")).await.unwrap();
        Ok(())
    }

    async fn validate(&self, staged: &Path) -> Result<(), ToolFailure> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let text = tokio::fs::read_to_string(staged).await.unwrap();
        if text.contains("SLEEPY") {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        if text.contains("bogus_directive") {
            return Err(ToolFailure::Rejected(
                "Error: adapting config using caddyfile: unrecognized directive: bogus_directive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Isolated on-disk layout plus the state built on top of it.
pub struct Harness {
    pub tmp: TempDir,
    pub config: LanderConfig,
    pub state: AppState,
    pub validator: Arc<FakeValidator>,
}

impl Harness {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        std::fs::create_dir_all(root.join("static")).unwrap();
        std::fs::write(root.join("static/index.html"), "<h1>landing</h1>").unwrap();
        std::fs::write(root.join("static/admin.html"), "<h1>admin</h1>").unwrap();
        std::fs::write(root.join("static/app.css"), "body {}").unwrap();
        std::fs::write(root.join("template.json"), r#"{"title":"Welcome","links":[]}"#).unwrap();

        let mut config = LanderConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.admin.password = PASSWORD.to_string();
        config.paths.static_dir = root.join("static");
        config.paths.content_template = root.join("template.json");
        config.paths.content = root.join("var/content.json");
        config.paths.caddyfile = root.join("config/Caddyfile");
        config.paths.caddyfile_backups = root.join("config/backup");
        config.paths.content_backups = root.join("config/content-backup");
        config.paths.staging = root.join("tmp/caddyfile.upload");

        let validator = Arc::new(FakeValidator::default());
        let state = AppState::with_validator(&config, validator.clone());

        Self {
            tmp,
            config,
            state,
            validator,
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    pub fn caddyfile(&self) -> PathBuf {
        self.config.paths.caddyfile.clone()
    }

    pub fn backup_count(&self, dir: &str) -> usize {
        match std::fs::read_dir(self.path(dir)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub harness: Harness,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Bootstrap the harness and serve it on 127.0.0.1.
pub async fn start_server(harness: Harness) -> TestServer {
    startup::bootstrap(&harness.state).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_state(harness.config.clone(), harness.state.clone());
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer {
        addr,
        shutdown,
        harness,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
