//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use crate::quoting::FieldPath;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.timeouts.fetch_ms, 200);
        assert_eq!(config.timeouts.persist_ms, 10);
        assert_eq!(config.client.timeout_ms, 10);
        assert_eq!(config.storage.table, "currency");
        assert_eq!(config.client.label, "Dólar");
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            source_url = "http://127.0.0.1:9000/json/last/EUR-BRL"
            bid_field = "EURBRL.bid"

            [timeouts]
            fetch_ms = 500

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.bid_field, "EURBRL.bid".parse::<FieldPath>().unwrap());
        assert_eq!(config.timeouts.fetch_ms, 500);
        assert_eq!(config.timeouts.persist_ms, 10);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn malformed_field_path_is_a_parse_error() {
        let err = parse_config("[client]\nbid_field = \"a..b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_errors_are_reported() {
        let err = parse_config("[timeouts]\nfetch_ms = 10\npersist_ms = 10\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
