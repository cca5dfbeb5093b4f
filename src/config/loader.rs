//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::LanderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `admin.password`.
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LanderConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<LanderConfig, ConfigError> {
    let config: LanderConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load from `path` if given, otherwise start from defaults, then apply
/// environment overrides.
pub fn load_with_env(path: Option<&Path>) -> Result<LanderConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => LanderConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply overrides from a variable lookup. An empty `ADMIN_PASSWORD`
/// disables authentication.
pub fn apply_env_overrides(config: &mut LanderConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(password) = lookup(ADMIN_PASSWORD_ENV) {
        config.admin.password = password;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.paths.caddyfile, PathBuf::from("/config/Caddyfile"));
        assert_eq!(config.backups.retain, 10);
        assert!(config.admin.uses_default_password());
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = parse_config(include_str!("../../lander.example.toml")).unwrap();
        let defaults = LanderConfig::default();
        assert_eq!(config.paths.staging, defaults.paths.staging);
        assert_eq!(config.caddy.binary, defaults.caddy.binary);
        assert_eq!(config.timeouts.request_secs, defaults.timeouts.request_secs);
        assert_eq!(config.listener.max_body_bytes, defaults.listener.max_body_bytes);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = parse_config(
            r#"
            [paths]
            caddyfile = "/srv/Caddyfile"

            [caddy]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.caddyfile, PathBuf::from("/srv/Caddyfile"));
        assert_eq!(config.paths.staging, PathBuf::from("/tmp/caddyfile.upload"));
        assert_eq!(config.caddy.timeout_secs, 5);
        assert_eq!(config.caddy.adapter, "caddyfile");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("[backups]\nretain = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("backups.retain"));

        assert!(matches!(parse_config("[listener\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_override_password() {
        let mut config = LanderConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == ADMIN_PASSWORD_ENV).then(|| "hunter2".to_string())
        });
        assert_eq!(config.admin.password, "hunter2");
        assert!(!config.admin.uses_default_password());

        apply_env_overrides(&mut config, |_| Some(String::new()));
        assert!(config.admin.password.is_empty());
    }
}
