//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → env overrides (ADMIN_PASSWORD)
//!     → LanderConfig (validated, immutable)
//!     → used once at startup to build the stores
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_with_env, ConfigError};
pub use schema::AdminConfig;
pub use schema::CaddyConfig;
pub use schema::LanderConfig;
pub use schema::PathsConfig;
