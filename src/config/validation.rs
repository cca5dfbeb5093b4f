//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, retention >= 1)
//! - Detect conflicting paths (shared backup dirs, staging over live)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LanderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::LanderConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &LanderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.caddy.timeout_secs == 0 {
        errors.push(ValidationError::new("caddy.timeout_secs", "must be greater than 0"));
    }
    // A submission runs caddy twice; the request must outlive both runs.
    if config.timeouts.request_secs > 0
        && config.caddy.timeout_secs > 0
        && config.timeouts.request_secs <= 2 * config.caddy.timeout_secs
    {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed twice caddy.timeout_secs ({})",
                2 * config.caddy.timeout_secs
            ),
        ));
    }
    if config.caddy.binary.as_os_str().is_empty() {
        errors.push(ValidationError::new("caddy.binary", "must not be empty"));
    }
    if config.caddy.adapter.trim().is_empty() {
        errors.push(ValidationError::new("caddy.adapter", "must not be empty"));
    }
    if config.backups.retain == 0 {
        errors.push(ValidationError::new("backups.retain", "must keep at least one backup"));
    }
    if config.paths.caddyfile_backups == config.paths.content_backups {
        errors.push(ValidationError::new(
            "paths.content_backups",
            "must differ from paths.caddyfile_backups",
        ));
    }
    if config.paths.staging == config.paths.caddyfile {
        errors.push(ValidationError::new("paths.staging", "must differ from paths.caddyfile"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&LanderConfig::default()).is_ok());
    }

    #[test]
    fn test_request_timeout_must_cover_both_caddy_runs() {
        let mut config = LanderConfig::default();
        config.caddy.timeout_secs = 45;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 91;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = LanderConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.backups.retain = 0;
        config.caddy.timeout_secs = 0;
        config.paths.content_backups = config.paths.caddyfile_backups.clone();
        config.paths.staging = config.paths.caddyfile.clone();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "caddy.timeout_secs",
                "backups.retain",
                "paths.content_backups",
                "paths.staging",
            ]
        );
    }
}
