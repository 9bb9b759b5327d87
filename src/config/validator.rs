use crate::config::{parse_duration, Config, SCHEMA_VERSION};
use crate::error::{Result, SmartgrepError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_gateway(config, &mut errors);
        Self::validate_display(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SmartgrepError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_gateway(config: &Config, errors: &mut Vec<ValidationError>) {
        let url = config.gateway.base_url.trim();
        if url.is_empty() {
            errors.push(ValidationError::new(
                "gateway.base_url",
                "Base URL cannot be empty",
            ));
        } else if !Self::is_http_url(url) {
            errors.push(ValidationError::new(
                "gateway.base_url",
                format!("Base URL must start with http:// or https://, got '{}'", url),
            ));
        }

        match parse_duration(&config.gateway.request_timeout) {
            None => errors.push(ValidationError::new(
                "gateway.request_timeout",
                format!(
                    "Invalid duration format: {}",
                    config.gateway.request_timeout
                ),
            )),
            Some(timeout) if timeout.is_zero() => errors.push(ValidationError::new(
                "gateway.request_timeout",
                "Request timeout must be greater than 0",
            )),
            Some(_) => {}
        }
    }

    fn validate_display(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.display.highlight_marker.trim().is_empty() {
            errors.push(ValidationError::new(
                "display.highlight_marker",
                "Highlight marker cannot be blank",
            ));
        }
    }

    fn is_http_url(url: &str) -> bool {
        ["http://", "https://"].iter().any(|scheme| {
            url.strip_prefix(scheme)
                .is_some_and(|rest| !rest.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_bad_base_url() {
        let mut config = Config::default();
        config.gateway.base_url = "ftp://example.com".to_string();
        assert!(ConfigValidator::validate(&config).is_err());

        config.gateway.base_url = "https://".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.gateway.request_timeout = "0s".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.meta.schema_version = "0.9.0".to_string();
        config.gateway.request_timeout = "soon".to_string();
        config.display.highlight_marker = " ".to_string();

        match ConfigValidator::validate(&config) {
            Err(SmartgrepError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "_meta.schema_version",
                        "gateway.request_timeout",
                        "display.highlight_marker"
                    ]
                );
            }
            other => panic!("Expected validation failure, got {:?}", other),
        }
    }
}
