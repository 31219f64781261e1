//! HTTP Server Configuration
//!
//! Host, port and CORS settings for the API server.

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse the configured CORS origins.
    ///
    /// Each entry must be an `http://` or `https://` origin. A wildcard is
    /// refused here; an empty list already means any origin.
    pub fn origin_values(&self) -> Result<Vec<HeaderValue>, String> {
        self.cors_origins
            .iter()
            .map(|origin| {
                let valid = origin != "*"
                    && (origin.starts_with("http://") || origin.starts_with("https://"));
                if !valid {
                    return Err(format!("invalid CORS origin {:?}", origin));
                }
                HeaderValue::from_str(origin).map_err(|_| format!("invalid CORS origin {:?}", origin))
            })
            .collect()
    }
}
