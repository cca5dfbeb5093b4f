//! caddy-lander: admin control plane for a Caddyfile and its landing page.

pub mod backup;
pub mod config;
pub mod documents;
pub mod error;
pub mod gate;
pub mod hosts;
pub mod promotion;

pub mod admin;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::LanderConfig;
pub use error::LanderError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
