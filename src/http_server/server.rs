//! # HTTP Server
//!
//! Combines the endpoint routers behind one CORS layer.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::auth_routes::auth_routes;
use super::column_routes::column_routes;
use super::common::AppState;
use super::config::HttpServerConfig;
use super::feed_routes::feed_routes;
use super::file_routes::file_routes;
use crate::observability::{log_event, Event};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn with_state(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            // Config::validate has already rejected bad origins; an unchecked
            // config that still carries one allows no origin at all
            let origins = config.origin_values().unwrap_or_default();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(health_handler))
            .nest("/auth", auth_routes(state.clone()))
            .nest("/feeds", feed_routes(state.clone()))
            .nest("/files", file_routes(state.clone()))
            .nest("/columns", column_routes(state))
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let addr_str = addr.to_string();
        log_event(Event::Serving, &[("addr", &addr_str)]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        log_event(Event::ShutdownComplete, &[]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, JwtManager};
    use crate::loader::{LoaderService, LocalBackend, ServiceOptions};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(temp: &TempDir) -> Arc<AppState> {
        let backend = LocalBackend::new(temp.path().to_path_buf());
        let service = LoaderService::new(backend, ServiceOptions::default());
        Arc::new(AppState::new(service, JwtManager::new(JwtConfig::default())))
    }

    #[test]
    fn test_server_with_custom_port() {
        let temp = TempDir::new().unwrap();
        let server = HttpServer::with_state(HttpServerConfig::with_port(8080), test_state(&temp));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_health() {
        let temp = TempDir::new().unwrap();
        let router = HttpServer::with_state(HttpServerConfig::default(), test_state(&temp)).router();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_feed_listing_rejected() {
        let temp = TempDir::new().unwrap();
        let router = HttpServer::with_state(HttpServerConfig::default(), test_state(&temp)).router();

        let response = router
            .oneshot(Request::builder().uri("/feeds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
