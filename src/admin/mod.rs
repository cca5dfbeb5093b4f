pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes, all behind Basic authentication.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/api/admin/info", get(get_info))
        .route("/api/upload", post(upload_content))
        .route("/admin/caddyfile", get(get_caddyfile).post(submit_caddyfile))
        .route("/api/admin/content/backups", get(list_content_backups))
        .route("/api/admin/content/backup", get(get_content_backup))
        .route("/api/admin/content/restore", post(restore_content))
        .route("/api/admin/content/generate", get(generate_content))
        .route("/api/admin/caddyfile/backups", get(list_caddyfile_backups))
        .route("/api/admin/caddyfile/backup", get(get_caddyfile_backup))
        .route("/api/admin/caddyfile/restore", post(restore_caddyfile))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
