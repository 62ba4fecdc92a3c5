//! Configuration module
//!
//! Configuration is read once at process start from the environment (and an optional
//! `.env` file). Every value has a default so the service starts with no settings at
//! all; values that are present but malformed are rejected instead of silently
//! replaced.

use std::env;
use std::path::PathBuf;

const SERVER_PORT: u16 = 8080;
const MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;
const STORAGE_PATH: &str = "/app/uploads";
const TEMP_PATH: &str = "/app/temp";
const ALLOWED_EXTENSIONS: &str = ".pdf,.docx,.doc,.txt";

/// Upload policy and storage locations.
#[derive(Clone, Debug)]
pub struct FileUploadOptions {
    pub storage_path: PathBuf,
    pub temp_path: PathBuf,
    pub max_file_size_bytes: u64,
    /// Lowercase, dot-prefixed (e.g. ".pdf")
    pub allowed_extensions: Vec<String>,
}

impl Default for FileUploadOptions {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(STORAGE_PATH),
            temp_path: PathBuf::from(TEMP_PATH),
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            allowed_extensions: parse_extensions(ALLOWED_EXTENSIONS),
        }
    }
}

impl FileUploadOptions {
    /// Maximum size in whole megabytes, as shown to callers.
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / 1024 / 1024
    }
}

/// Strings used by the OpenAPI document and the service health endpoint.
#[derive(Clone, Debug)]
pub struct ApiSettings {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            title: "Document Upload API".to_string(),
            version: "v1".to_string(),
            description: "A minimal API for document upload operations".to_string(),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Clone, Debug)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub service_version: String,
    pub log_format: LogFormat,
    /// OTLP collector endpoint. Metrics stay in-process when unset.
    pub otlp_endpoint: Option<String>,
    /// "grpc" or "http"
    pub otlp_protocol: String,
    pub metrics_interval_secs: u64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: "DocumentUploadAPI".to_string(),
            service_version: "1.0.0".to_string(),
            log_format: LogFormat::Compact,
            otlp_endpoint: None,
            otlp_protocol: "grpc".to_string(),
            metrics_interval_secs: 30,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub file_upload: FileUploadOptions,
    pub api: ApiSettings,
    pub telemetry: TelemetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            file_upload: FileUploadOptions::default(),
            api: ApiSettings::default(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);
        let is_production = is_production_name(&environment);

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => defaults.server_port,
        };

        let max_file_size_bytes = match lookup("FILE_UPLOAD_MAX_FILE_SIZE_BYTES") {
            Some(value) => value.trim().parse().map_err(|_| {
                anyhow::anyhow!("FILE_UPLOAD_MAX_FILE_SIZE_BYTES must be a positive integer")
            })?,
            None => defaults.file_upload.max_file_size_bytes,
        };

        let file_upload = FileUploadOptions {
            storage_path: lookup("FILE_UPLOAD_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_upload.storage_path),
            temp_path: lookup("FILE_UPLOAD_TEMP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_upload.temp_path),
            max_file_size_bytes,
            allowed_extensions: lookup("FILE_UPLOAD_ALLOWED_EXTENSIONS")
                .map(|s| parse_extensions(&s))
                .unwrap_or(defaults.file_upload.allowed_extensions),
        };

        let api = ApiSettings {
            title: lookup("API_TITLE").unwrap_or(defaults.api.title),
            version: lookup("API_VERSION").unwrap_or(defaults.api.version),
            description: lookup("API_DESCRIPTION").unwrap_or(defaults.api.description),
        };

        let log_format = match lookup("LOG_FORMAT").map(|s| s.trim().to_lowercase()) {
            None => LogFormat::Compact,
            Some(f) if f == "compact" => LogFormat::Compact,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                    other
                ))
            }
        };

        let otlp_protocol = match lookup("OTEL_EXPORTER_OTLP_PROTOCOL")
            .map(|s| s.trim().to_lowercase())
        {
            None => defaults.telemetry.otlp_protocol,
            Some(p) if p == "grpc" || p == "http" => p,
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "OTEL_EXPORTER_OTLP_PROTOCOL must be 'grpc' or 'http', got '{}'",
                    other
                ))
            }
        };

        let metrics_interval_secs = match lookup("OTEL_METRICS_INTERVAL_SECS") {
            Some(value) => value.trim().parse().map_err(|_| {
                anyhow::anyhow!("OTEL_METRICS_INTERVAL_SECS must be a positive integer")
            })?,
            None => defaults.telemetry.metrics_interval_secs,
        };

        let telemetry = TelemetrySettings {
            service_name: lookup("OTEL_SERVICE_NAME")
                .or_else(|| lookup("SERVICE_NAME"))
                .unwrap_or(defaults.telemetry.service_name),
            service_version: lookup("OTEL_SERVICE_VERSION")
                .or_else(|| lookup("SERVICE_VERSION"))
                .unwrap_or(defaults.telemetry.service_version),
            log_format,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            otlp_protocol,
            metrics_interval_secs,
        };

        Ok(Config {
            server_port,
            environment,
            cors_origins,
            file_upload,
            api,
            telemetry,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.file_upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "FILE_UPLOAD_MAX_FILE_SIZE_BYTES must be greater than 0"
            ));
        }
        if self.file_upload.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "FILE_UPLOAD_ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }
        if self.file_upload.storage_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("FILE_UPLOAD_STORAGE_PATH cannot be empty"));
        }
        if self.file_upload.temp_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("FILE_UPLOAD_TEMP_PATH cannot be empty"));
        }
        if self.telemetry.metrics_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "OTEL_METRICS_INTERVAL_SECS must be greater than 0"
            ));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Normalize a comma-separated extension list to lowercase, dot-prefixed entries.
pub fn parse_extensions(list: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for raw in list.split(',') {
        let ext = raw.trim().to_lowercase();
        if ext.is_empty() || ext == "." {
            continue;
        }
        let ext = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.file_upload.max_file_size_bytes, 104_857_600);
        assert_eq!(config.file_upload.max_file_size_mb(), 100);
        assert_eq!(
            config.file_upload.allowed_extensions,
            vec![".pdf", ".docx", ".doc", ".txt"]
        );
        assert_eq!(config.file_upload.storage_path, PathBuf::from("/app/uploads"));
        assert_eq!(config.file_upload.temp_path, PathBuf::from("/app/temp"));
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert!(config.telemetry.otlp_endpoint.is_none());
        assert_eq!(config.telemetry.otlp_protocol, "grpc");
        assert_eq!(config.telemetry.metrics_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("FILE_UPLOAD_STORAGE_PATH", "/data/docs"),
            ("FILE_UPLOAD_MAX_FILE_SIZE_BYTES", "1048576"),
            ("FILE_UPLOAD_ALLOWED_EXTENSIONS", "PDF, .Txt ,md"),
            ("LOG_FORMAT", "json"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4318"),
            ("OTEL_EXPORTER_OTLP_PROTOCOL", "HTTP"),
            ("OTEL_METRICS_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.server_port(), 9000);
        assert_eq!(config.file_upload.storage_path, PathBuf::from("/data/docs"));
        assert_eq!(config.file_upload.max_file_size_mb(), 1);
        assert_eq!(
            config.file_upload.allowed_extensions,
            vec![".pdf", ".txt", ".md"]
        );
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://collector:4318")
        );
        assert_eq!(config.telemetry.otlp_protocol, "http");
        assert_eq!(config.telemetry.metrics_interval_secs, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("FILE_UPLOAD_MAX_FILE_SIZE_BYTES", "-5")]).is_err());
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config_from(&[("OTEL_EXPORTER_OTLP_PROTOCOL", "udp")]).is_err());
        assert!(config_from(&[("OTEL_METRICS_INTERVAL_SECS", "soon")]).is_err());
        assert!(config_from(&[("OTEL_METRICS_INTERVAL_SECS", "0")])
            .unwrap()
            .validate()
            .is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).is_err());
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://docs.example.com"),
        ])
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_validate_rejects_empty_policy() {
        let mut config = Config::default();
        config.file_upload.allowed_extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.file_upload.max_file_size_bytes = 0;
        assert!(config.validate().is_err());
    }
}
