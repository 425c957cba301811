//! Configuration module for Filebox.

use serde::Deserialize;
use std::path::Path;

use crate::{FileboxError, Result};

/// Bytes per megabyte used for all size settings.
const MB: u64 = 1024 * 1024;

/// Largest accepted size setting (1 TiB), keeping byte limits far from overflow.
const MAX_SIZE_MB: u64 = 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timezone for timestamps in responses (e.g., "UTC", "Europe/Moscow").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9080
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timezone: default_timezone(),
        }
    }
}

/// Upload directory and size limits.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the upload directory.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Maximum size of a single file in megabytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u64,
    /// Maximum size of a batch upload request in megabytes.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size_mb: u64,
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10
}

fn default_max_batch_size() -> u64 {
    50
}

impl StorageConfig {
    /// Per-file limit in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(MB)
    }

    /// Batch request limit in bytes.
    pub fn max_batch_bytes(&self) -> u64 {
        self.max_batch_size_mb.saturating_mul(MB)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_file_size_mb: default_max_file_size(),
            max_batch_size_mb: default_max_batch_size(),
        }
    }
}

/// Web layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve static files under `/assets`.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_static_path() -> String {
    "assets".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            serve_static: false,
            static_path: default_static_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filebox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FileboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FileboxError::Config(format!("parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEBOX_UPLOAD_DIR`: Override the upload directory
    /// - `FILEBOX_PORT`: Override the listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FILEBOX_UPLOAD_DIR") {
            if !dir.is_empty() {
                self.storage.upload_dir = dir;
            }
        }

        if let Ok(port) = std::env::var("FILEBOX_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => eprintln!("Ignoring invalid FILEBOX_PORT: {port}"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.upload_dir.trim().is_empty() {
            return Err(FileboxError::Config("upload_dir must not be empty".to_string()));
        }
        if self.storage.max_file_size_mb == 0 {
            return Err(FileboxError::Config(
                "max_file_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.storage.max_batch_size_mb > MAX_SIZE_MB {
            return Err(FileboxError::Config(format!(
                "max_batch_size_mb must not exceed {MAX_SIZE_MB}"
            )));
        }
        if self.storage.max_batch_size_mb < self.storage.max_file_size_mb {
            return Err(FileboxError::Config(
                "max_batch_size_mb must not be smaller than max_file_size_mb".to_string(),
            ));
        }
        if self.server.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(FileboxError::Config(format!(
                "unknown timezone: {}",
                self.server.timezone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9080);
        assert_eq!(config.server.timezone, "UTC");

        assert_eq!(config.storage.upload_dir, "./uploads");
        assert_eq!(config.storage.max_file_size_mb, 10);
        assert_eq!(config.storage.max_batch_size_mb, 50);
        assert_eq!(config.storage.max_file_bytes(), 10 << 20);
        assert_eq!(config.storage.max_batch_bytes(), 50 << 20);

        assert!(config.web.cors_origins.is_empty());
        assert!(!config.web.serve_static);
        assert_eq!(config.web.static_path, "assets");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/filebox.log");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
timezone = "Europe/Moscow"

[storage]
upload_dir = "/srv/uploads"
max_file_size_mb = 20
max_batch_size_mb = 100

[web]
cors_origins = ["http://localhost:3000"]
serve_static = true
static_path = "public"

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.timezone, "Europe/Moscow");

        assert_eq!(config.storage.upload_dir, "/srv/uploads");
        assert_eq!(config.storage.max_file_size_mb, 20);
        assert_eq!(config.storage.max_batch_size_mb, 100);

        assert_eq!(config.web.cors_origins, vec!["http://localhost:3000"]);
        assert!(config.web.serve_static);
        assert_eq!(config.web.static_path, "public");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[storage]
upload_dir = "data"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.storage.upload_dir, "data");
        assert_eq!(config.storage.max_file_size_mb, 10);
        assert_eq!(config.server.port, 9080);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("this is not [valid toml");
        assert!(matches!(result, Err(FileboxError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(FileboxError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_load_with_env_overrides_upload_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nupload_dir = \"/from/file\"\n").unwrap();

        // Save original value
        let original = std::env::var("FILEBOX_UPLOAD_DIR").ok();

        std::env::set_var("FILEBOX_UPLOAD_DIR", "/from/env");
        let config = Config::load_with_env(&path).unwrap();
        assert_eq!(config.storage.upload_dir, "/from/env");

        // An empty value keeps the file setting
        std::env::set_var("FILEBOX_UPLOAD_DIR", "");
        let config = Config::load_with_env(&path).unwrap();
        assert_eq!(config.storage.upload_dir, "/from/file");

        // Restore original value
        match original {
            Some(val) => std::env::set_var("FILEBOX_UPLOAD_DIR", val),
            None => std::env::remove_var("FILEBOX_UPLOAD_DIR"),
        }
    }

    #[test]
    fn test_validate_zero_file_size() {
        let mut config = Config::default();
        config.storage.max_file_size_mb = 0;
        assert!(matches!(config.validate(), Err(FileboxError::Config(_))));
    }

    #[test]
    fn test_validate_batch_smaller_than_file() {
        let mut config = Config::default();
        config.storage.max_file_size_mb = 20;
        config.storage.max_batch_size_mb = 10;
        assert!(matches!(config.validate(), Err(FileboxError::Config(_))));
    }

    #[test]
    fn test_validate_huge_size_rejected() {
        let mut config = Config::default();
        config.storage.max_file_size_mb = u64::MAX / 2;
        config.storage.max_batch_size_mb = u64::MAX / 2;

        assert!(matches!(config.validate(), Err(FileboxError::Config(_))));
        assert_eq!(config.storage.max_file_bytes(), u64::MAX);
    }

    #[test]
    fn test_validate_unknown_timezone() {
        let mut config = Config::default();
        config.server.timezone = "Mars/Olympus".to_string();
        assert!(matches!(config.validate(), Err(FileboxError::Config(_))));
    }
}
