//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
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
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ClientConfig = toml::from_str(&content)?;
    config.apply_env_overrides();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults and the environment only.
pub fn load_from_env() -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();
    config.apply_env_overrides();
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_load_valid_file() {
        let path = temp_path("console-config");
        fs::write(
            &path,
            r#"
            [api]
            base_url = "https://seller.example.com"

            [session]
            login_route = "/auth/sign-in"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.session.login_route, "/auth/sign-in");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/console.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let path = temp_path("console-bad");
        fs::write(&path, "[api\nbase_url = 1").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let path = temp_path("console-invalid");
        fs::write(
            &path,
            r#"
            [api]
            refresh_path = "refresh"
            login_path = "login"
            "#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("api.refresh_path"));
        assert!(message.contains("api.login_path"));

        fs::remove_file(&path).unwrap_or_default();
    }
}
