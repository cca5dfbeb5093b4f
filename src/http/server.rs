//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with public and admin handlers
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Build the document stores from configuration
//! - Bind server to listener and shut down gracefully

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::backup::{BackupStore, DocumentKind};
use crate::config::{AdminConfig, LanderConfig};
use crate::documents::ContentStore;
use crate::error::LanderError;
use crate::gate::{CaddyCli, ConfigValidator, ValidationGate};
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::promotion::ConfigPromoter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentStore>,
    pub caddyfile: Arc<ConfigPromoter>,
    pub admin: Arc<AdminConfig>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Build the stores described by `config`, validating Caddyfiles with
    /// the configured caddy binary.
    pub fn from_config(config: &LanderConfig) -> Self {
        Self::with_validator(config, Arc::new(CaddyCli::from_config(&config.caddy)))
    }

    /// Build the stores described by `config` around a custom validator.
    pub fn with_validator(config: &LanderConfig, validator: Arc<dyn ConfigValidator>) -> Self {
        let paths = &config.paths;
        let retain = config.backups.retain;

        let content = ContentStore::new(
            &paths.content,
            &paths.content_template,
            BackupStore::new(DocumentKind::Content, &paths.content_backups).with_retain(retain),
        );
        let caddyfile = ConfigPromoter::new(
            &paths.caddyfile,
            &paths.staging,
            BackupStore::new(DocumentKind::Caddyfile, &paths.caddyfile_backups).with_retain(retain),
            ValidationGate::new(validator),
        );

        Self {
            content: Arc::new(content),
            caddyfile: Arc::new(caddyfile),
            admin: Arc::new(config.admin.clone()),
            static_dir: Arc::new(paths.static_dir.clone()),
        }
    }
}

/// HTTP server for the admin control plane.
pub struct HttpServer {
    router: Router,
    config: LanderConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: LanderConfig) -> Self {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    /// Create a server around prebuilt state.
    pub fn with_state(config: LanderConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &LanderConfig, state: AppState) -> Router {
        let static_files = ServeDir::new(state.static_dir.as_ref());

        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::disable());

        Router::new()
            .route("/", get(index_page))
            .route("/api/content", get(get_content))
            .nest_service("/static", static_files)
            .merge(setup_admin_router(state.clone()))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            caddyfile = %self.config.paths.caddyfile.display(),
            content = %self.config.paths.content.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LanderConfig {
        &self.config
    }
}

/// Serve a page from the static directory, or 404.
pub(crate) async fn static_page(dir: &Path, file: &str) -> Response {
    match tokio::fs::read(dir.join(file)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "text/html")], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn index_page(State(state): State<AppState>) -> Response {
    static_page(&state.static_dir, "index.html").await
}

/// Public read of the live content document.
async fn get_content(State(state): State<AppState>) -> Response {
    match state.content.read().await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(LanderError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => e.into_response(),
    }
}
