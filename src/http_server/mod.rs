//! # HTTP Server Module
//!
//! JSON API over the loader service.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/auth/*` - Login, current user, user management
//! - `/feeds/*` - Feeds, membership and uploads
//! - `/files/*` - File metadata, download and deletion
//! - `/columns/*` - Column descriptors

pub mod auth_routes;
pub mod column_routes;
pub mod common;
pub mod config;
pub mod feed_routes;
pub mod file_routes;
pub mod server;

pub use common::AppState;
pub use config::HttpServerConfig;
pub use server::HttpServer;
