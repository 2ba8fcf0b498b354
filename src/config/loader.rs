//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;

    tracing::debug!(path = %path.display(), routes = config.routes.len(), "Configuration file loaded");
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsConfig;
    use std::io::Write;

    #[test]
    fn minimal_file_falls_back_to_unified_preset() {
        let config = parse_config("[listener]\nbind_address = \"127.0.0.1:9443\"\n").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9443");
        assert_eq!(config.routes.len(), 4);
        assert_eq!(config.cors.max_age_secs, 86_400);
    }

    #[test]
    fn listener_section_without_tls_is_plaintext() {
        let config = parse_config("[listener]\nbind_address = \"127.0.0.1:9000\"\n").unwrap();
        assert_eq!(config.listener.tls, None);
    }

    #[test]
    fn tls_table_enables_tls_with_default_material() {
        let config = parse_config("[listener]\nbind_address = \"0.0.0.0:9443\"\n[listener.tls]\n").unwrap();
        assert_eq!(config.listener.tls, Some(TlsConfig::default()));

        let toml = r#"
            [listener.tls]
            cert_path = "/etc/gateway/cert.pem"
            key_path = "/etc/gateway/key.pem"
        "#;
        let tls = parse_config(toml).unwrap().listener.tls.unwrap();
        assert_eq!(tls.cert_path, "/etc/gateway/cert.pem");
        assert_eq!(tls.key_path, "/etc/gateway/key.pem");
    }

    #[test]
    fn explicit_tables_replace_defaults() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:8081"

            [[upstreams]]
            name = "control"
            base_url = "http://127.0.0.1:5000"
            timeout_ms = 5000

            [[routes]]
            name = "robot"
            path_prefix = "/robot/"
            upstream = "control"
            rewrite = "/"
            methods = ["GET", "POST"]
        "#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.upstreams.len(), 1);
        assert_eq!(config.upstreams[0].timeout_ms, 5000);
        assert_eq!(config.routes[0].rewrite.as_deref(), Some("/"));
        assert_eq!(config.routes[0].methods, vec!["GET", "POST"]);
    }

    #[test]
    fn semantic_errors_surface_as_validation() {
        let toml = r#"
            [[routes]]
            name = "broken"
            path_prefix = "/x/"
            upstream = "missing"
        "#;

        match parse_config(toml) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn syntax_errors_surface_as_parse() {
        assert!(matches!(
            parse_config("[listener\nbind_address = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nmax_in_flight = 8").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.client.max_in_flight, 8);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
