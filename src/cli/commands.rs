//! CLI command implementations
//!
//! Administrative commands act on the catalog directly with a system
//! context; `serve` exposes the same service over HTTP.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::auth::{JwtManager, RequestContext};
use crate::config::Config;
use crate::http_server::auth_routes::UserResponse;
use crate::http_server::column_routes::ColumnResponse;
use crate::http_server::feed_routes::FeedResponse;
use crate::http_server::file_routes::FileResponse;
use crate::http_server::{AppState, HttpServer};
use crate::loader::{CatalogStore, ColumnType, DataDirLock, LoaderService, LocalBackend};
use crate::observability::{log_event, Event};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Serve { config, port } => return serve(&config, port),
        Command::Init { config, data_dir } => init(&config, &data_dir)?,
        Command::UserCreate {
            config,
            username,
            email,
            password,
            admin,
        } => user_create(&config, &username, &email, &password, admin)?,
        Command::FeedCreate { config, name } => feed_create(&config, &name)?,
        Command::FeedAddUser {
            config,
            feed,
            username,
        } => feed_add_user(&config, &feed, &username)?,
        Command::FeedRemoveUser {
            config,
            feed,
            username,
        } => feed_remove_user(&config, &feed, &username)?,
        Command::ColumnCreate {
            config,
            name,
            col_type,
        } => column_create(&config, &name, &col_type)?,
        Command::Files { config, feed } => files(&config, &feed)?,
    };

    write_response(data)
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    let path = config_path.display().to_string();
    log_event(Event::ConfigLoaded, &[("path", &path)]);
    Ok(config)
}

/// Open the service over an initialized data directory. The service holds
/// the data directory lock, so a running server and a command never share it.
fn open_service(config: &Config) -> CliResult<LoaderService<LocalBackend>> {
    let store = CatalogStore::in_dir(&config.data_dir);
    if !store.exists() {
        return Err(CliError::not_initialized());
    }

    let backend = LocalBackend::new(config.files_dir());
    Ok(LoaderService::open(backend, store, config.service_options()?)?)
}

/// Writes a default config when `config_path` is missing, then creates the
/// data directory and an empty catalog.
pub fn init(config_path: &Path, data_dir: &Path) -> CliResult<Value> {
    let created_config = !config_path.exists();
    let config = if created_config {
        let config = Config::generate(data_dir.to_path_buf());
        config.save(config_path)?;
        config
    } else {
        load_config(config_path)?
    };

    let _lock = DataDirLock::acquire(&config.data_dir)?;
    let store = CatalogStore::in_dir(&config.data_dir);
    if store.exists() {
        return Err(CliError::already_initialized());
    }

    fs::create_dir_all(config.files_dir())
        .map_err(|e| CliError::io_error(format!("Failed to create data directory: {}", e)))?;

    let backend = LocalBackend::new(config.files_dir());
    let service = LoaderService::new(backend, config.service_options()?);
    store.save(&service.snapshot()?)?;

    Ok(json!({
        "config": config_path.display().to_string(),
        "config_created": created_config,
        "data_dir": config.data_dir.display().to_string(),
    }))
}

pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart, &[]);

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let service = open_service(&config)?;
    let jwt = JwtManager::new(config.auth.jwt_config());
    let state = Arc::new(AppState::new(service, jwt));
    let server = HttpServer::with_state(config.http.clone(), state);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

pub fn user_create(
    config_path: &Path,
    username: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let user = service.register_user(username, email, password, admin, &RequestContext::system())?;
    Ok(serde_json::to_value(UserResponse::from(&user))?)
}

pub fn feed_create(config_path: &Path, name: &str) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let feed = service.create_feed(name, &RequestContext::system())?;
    Ok(serde_json::to_value(FeedResponse::from(&feed))?)
}

pub fn feed_add_user(config_path: &Path, feed: &str, username: &str) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let user = service.find_user(username)?;
    let feed = service.add_feed_user(feed, user.id, &RequestContext::system())?;
    Ok(serde_json::to_value(FeedResponse::from(&feed))?)
}

pub fn feed_remove_user(config_path: &Path, feed: &str, username: &str) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let user = service.find_user(username)?;
    let feed = service.remove_feed_user(feed, user.id, &RequestContext::system())?;
    Ok(serde_json::to_value(FeedResponse::from(&feed))?)
}

pub fn column_create(config_path: &Path, name: &str, col_type: &str) -> CliResult<Value> {
    let col_type: ColumnType = col_type.parse().map_err(CliError::config_error)?;

    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let column = service.create_column(name, col_type, &RequestContext::system())?;
    Ok(serde_json::to_value(ColumnResponse::from(&column))?)
}

pub fn files(config_path: &Path, feed: &str) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let files: Vec<FileResponse> = service
        .list_files(feed, &RequestContext::system())?
        .iter()
        .map(|f| FileResponse::from_file(f, feed))
        .collect();
    Ok(serde_json::to_value(files)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use tempfile::TempDir;

    fn initialized(temp: &TempDir) -> std::path::PathBuf {
        let config_path = temp.path().join("feedloader.json");
        init(&config_path, &temp.path().join("data")).unwrap();
        config_path
    }

    #[test]
    fn test_init_creates_config_and_catalog() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        assert!(config_path.is_file());
        assert!(temp.path().join("data").join("catalog.json").is_file());
        assert!(temp.path().join("data").join("files").is_dir());
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        let err = init(&config_path, &temp.path().join("data")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
    }

    #[test]
    fn test_commands_require_init() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("feedloader.json");
        Config::generate(temp.path().join("data")).save(&config_path).unwrap();

        let err = feed_create(&config_path, "prices").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_membership_commands_persist() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        user_create(&config_path, "alice", "alice@example.com", "password123", false).unwrap();
        feed_create(&config_path, "prices").unwrap();

        let feed = feed_add_user(&config_path, "prices", "alice").unwrap();
        assert_eq!(feed["users"].as_array().unwrap().len(), 1);

        let feed = feed_remove_user(&config_path, "prices", "alice").unwrap();
        assert!(feed["users"].as_array().unwrap().is_empty());

        let listed = files(&config_path, "prices").unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_feed_is_command_failure() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        feed_create(&config_path, "prices").unwrap();
        let err = feed_create(&config_path, "prices").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::CommandFailed);
    }

    #[test]
    fn test_commands_refused_while_data_dir_held() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        let held = DataDirLock::acquire(&temp.path().join("data")).unwrap();
        let err = feed_create(&config_path, "prices").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::AlreadyRunning);
        assert_eq!(err.code_str(), "FEEDLOADER_CLI_ALREADY_RUNNING");

        drop(held);
        feed_create(&config_path, "prices").unwrap();
    }

    #[test]
    fn test_column_create_rejects_unknown_type() {
        let temp = TempDir::new().unwrap();
        let config_path = initialized(&temp);

        let column = column_create(&config_path, "price", "float").unwrap();
        assert_eq!(column["col_type"], "float");

        assert!(column_create(&config_path, "blob", "blob").is_err());
    }
}
