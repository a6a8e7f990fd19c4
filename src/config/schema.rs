//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from `api.toml`.
//! Every section and field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::http::middleware::{BodyRedaction, LogPreset};
use crate::observability::{Format, Logger, ParseSeverityError, Severity};

/// Root configuration for the API server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Bind address, threshold, storage paths and TLS.
    pub server: ServerConfig,

    pub uploads: UploadsConfig,

    pub security: SecurityConfig,

    pub debug: DebugConfig,

    /// Output settings for the leveled logger.
    pub logging: LoggingConfig,

    /// Request/response logging middleware settings.
    pub request_logging: RequestLoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u32,

    /// Minimum severity written by the logger ("debug", "info", ...).
    pub log_level: String,

    pub data_dir: String,

    pub temp_dir: String,

    /// Serve HTTPS when present.
    pub tls: Option<TlsConfig>,
}

impl ServerConfig {
    /// `host:port` suitable for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn severity(&self) -> Result<Severity, ParseSeverityError> {
        self.log_level.parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            data_dir: "./data".to_string(),
            temp_dir: "./tmp".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Maximum request body size, in megabytes.
    pub max_file_size_mb: u64,

    /// Accepted file extensions.
    pub allowed_types: Vec<String>,
}

impl UploadsConfig {
    pub fn max_file_size_bytes(&self) -> usize {
        usize::try_from(self.max_file_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            allowed_types: [".txt", ".json", ".csv", ".pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub token_required: bool,

    /// Shared API key. Never logged.
    pub api_key: String,

    pub rate_limit_per_minute: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_required: false,
            api_key: String::new(),
            rate_limit_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

/// Logger output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One JSON object per line instead of text.
    pub json: bool,

    pub colorize: bool,

    /// Include `(file:line function)` in each record.
    pub show_caller: bool,
}

impl LoggingConfig {
    pub fn format(&self) -> Format {
        if self.json {
            Format::Json
        } else {
            Format::Text
        }
    }

    /// Apply these settings to a live logger.
    pub fn apply(&self, logger: &Logger) {
        logger
            .set_format(self.format())
            .set_colorize(self.colorize)
            .set_show_caller(self.show_caller);
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            colorize: true,
            show_caller: true,
        }
    }
}

/// Request logging settings. `preset` picks the base configuration and
/// every other field, when set, overrides it.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RequestLoggingConfig {
    pub preset: LogPreset,

    /// Exact paths that are never logged.
    pub skip_paths: Option<Vec<String>>,

    pub log_request_body: Option<bool>,

    pub log_response_body: Option<bool>,

    pub log_headers: Option<bool>,

    /// Capture limit for request and response bodies, in bytes.
    pub max_body_size: Option<usize>,

    pub redact_headers: Option<Vec<String>>,

    pub redact_body_fields: Option<Vec<String>>,

    pub body_redaction: Option<BodyRedaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.address(), "localhost:8080");
        assert_eq!(config.server.severity(), Ok(Severity::Info));
        assert_eq!(config.uploads.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.security.rate_limit_per_minute, 60);
        assert!(!config.debug.enabled);
        assert_eq!(config.logging.format(), Format::Text);
        assert_eq!(config.request_logging.preset, LogPreset::Default);
        assert!(config.request_logging.max_body_size.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [logging]
            json = true

            [request_logging]
            preset = "security_aware"
            redact_body_fields = ["ssn"]
            body_redaction = "json_keys"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.logging.format(), Format::Json);
        assert!(config.logging.colorize);
        assert_eq!(config.request_logging.preset, LogPreset::SecurityAware);
        assert_eq!(
            config.request_logging.redact_body_fields,
            Some(vec!["ssn".to_string()])
        );
        assert_eq!(config.request_logging.body_redaction, Some(BodyRedaction::JsonKeys));
    }

    #[test]
    fn test_tls_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [server.tls]
            cert_path = "cert.pem"
            key_path = "key.pem"
            "#,
        )
        .unwrap();

        let tls = config.server.tls.unwrap();
        assert_eq!(tls.cert_path, "cert.pem");
        assert_eq!(tls.key_path, "key.pem");
    }
}
