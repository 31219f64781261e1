//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "http": { "host": "0.0.0.0", "port": 8000, "cors_origins": [] },
//!   "auth": { "jwt_secret": "...", "token_ttl_minutes": 60, "issuer": "feedloader" },
//!   "storage": { "max_upload_bytes": 104857600 },
//!   "default_delimiter": ","
//! }
//! ```
//!
//! Only `data_dir` and `auth.jwt_secret` are required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::crypto::generate_secret;
use crate::auth::JwtConfig;
use crate::cli::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::loader::{Delimiter, ServiceOptions};

const MIN_SECRET_LEN: usize = 16;

/// One year
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_issuer() -> String {
    "feedloader".to_string()
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            access_token_ttl: chrono::Duration::try_minutes(
                self.token_ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES),
            )
            .unwrap_or_else(|| chrono::Duration::minutes(default_token_ttl_minutes())),
            issuer: self.issuer.clone(),
            audience: self.issuer.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024 // 100MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog and uploaded files live here
    pub data_dir: PathBuf,

    #[serde(default)]
    pub http: HttpServerConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_delimiter")]
    pub default_delimiter: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Config {
    /// A fresh configuration with a random signing secret
    pub fn generate(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            http: HttpServerConfig::default(),
            auth: AuthConfig {
                jwt_secret: generate_secret(),
                token_ttl_minutes: default_token_ttl_minutes(),
                issuer: default_issuer(),
            },
            storage: StorageConfig::default(),
            default_delimiter: default_delimiter(),
        }
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::config_error(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, json)
            .map_err(|e| CliError::io_error(format!("Failed to write config {}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(CliError::config_error(format!(
                "auth.jwt_secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        if self.auth.token_ttl_minutes <= 0 || self.auth.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(CliError::config_error(format!(
                "auth.token_ttl_minutes must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        if self.storage.max_upload_bytes == 0 {
            return Err(CliError::config_error("storage.max_upload_bytes must be > 0"));
        }

        self.http
            .origin_values()
            .map_err(|e| CliError::config_error(format!("http.cors_origins: {}", e)))?;

        Delimiter::new(&self.default_delimiter).map_err(|e| CliError::config_error(e.to_string()))?;

        Ok(())
    }

    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    pub fn service_options(&self) -> CliResult<ServiceOptions> {
        let default_delimiter =
            Delimiter::new(&self.default_delimiter).map_err(|e| CliError::config_error(e.to_string()))?;

        Ok(ServiceOptions {
            max_upload_bytes: self.storage.max_upload_bytes,
            default_delimiter,
            ..ServiceOptions::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"data_dir": "/tmp/feeds", "auth": {"jwt_secret": "0123456789abcdef"}}"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.auth.token_ttl_minutes, 60);
        assert_eq!(config.storage.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.default_delimiter, ",");
        assert_eq!(config.files_dir(), PathBuf::from("/tmp/feeds/files"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::generate(PathBuf::from("/tmp/feeds"));
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_delimiter_rejected() {
        let mut config = Config::generate(PathBuf::from("/tmp/feeds"));
        config.default_delimiter = "||".to_string();
        assert!(config.validate().is_err());

        config.default_delimiter = "|".to_string();
        assert_eq!(config.service_options().unwrap().default_delimiter.as_char(), '|');
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = Config::generate(PathBuf::from("/tmp/feeds"));

        for bad in [0, -5, MAX_TOKEN_TTL_MINUTES + 1, i64::MAX] {
            config.auth.token_ttl_minutes = bad;
            let err = config.validate().unwrap_err();
            assert_eq!(err.code_str(), "FEEDLOADER_CLI_CONFIG_ERROR");
        }

        config.auth.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.jwt_config().access_token_ttl.num_minutes(), MAX_TOKEN_TTL_MINUTES);

        // An unvalidated config never panics building the JWT settings
        config.auth.token_ttl_minutes = i64::MAX;
        assert_eq!(config.auth.jwt_config().access_token_ttl.num_minutes(), MAX_TOKEN_TTL_MINUTES);
    }

    #[test]
    fn test_bad_cors_origin_rejected() {
        let config: Config = serde_json::from_str(
            r#"{"data_dir": "/tmp/feeds", "auth": {"jwt_secret": "0123456789abcdef"},
                "http": {"cors_origins": ["https://feeds.example.com", "not an origin"]}}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let mut config = config;
        config.http.cors_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());

        config.http.cors_origins = vec!["https://feeds.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_save_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("feedloader.json");

        let config = Config::generate(temp.path().join("data"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.auth.jwt_secret, config.auth.jwt_secret);
        assert_eq!(loaded.data_dir, temp.path().join("data"));
    }
}
