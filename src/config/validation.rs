//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Base URL and app origin must be absolute http(s) URLs
//! - Endpoint paths and the login route must be absolute paths
//! - Value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("api.base_url", &config.api.base_url, &mut errors);
    if let Some(origin) = &config.session.app_origin {
        check_url("session.app_origin", origin, &mut errors);
    }

    check_path("api.refresh_path", &config.api.refresh_path, &mut errors);
    check_path("api.login_path", &config.api.login_path, &mut errors);
    check_path("session.login_route", &config.session.login_route, &mut errors);

    if config.session.poller.interval_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "session.poller.interval_secs",
        });
    }
    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::Zero {
            field: "timeouts.connect_secs",
        });
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn check_path(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".to_string();
        config.api.login_path = "api/v1/auth/login".to_string();
        config.session.poller.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::InvalidUrl { field: "api.base_url", .. }));
        assert!(matches!(errors[1], ValidationError::RelativePath { field: "api.login_path", .. }));
        assert_eq!(
            errors[2],
            ValidationError::Zero {
                field: "session.poller.interval_secs"
            }
        );
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.session.app_origin = Some("ftp://seller.example.com".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ClientConfig::default();
        config.timeouts.request_secs = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
