//! feedloader - feed-based file ingestion service
//!
//! Users upload delimited data files into named feeds they are members of.
//! Metadata lives in a JSON catalog, payloads under `data_dir/files`.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod loader;
pub mod observability;
