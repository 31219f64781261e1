//! CLI-specific error types
//!
//! Every CLI error is fatal: it is printed to stderr and the process exits 1.

use std::fmt;
use std::io;

use crate::loader::LoaderError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Boot failed
    BootFailed,
    /// Another process holds the data directory
    AlreadyRunning,
    /// A loader operation was refused or failed
    CommandFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FEEDLOADER_CLI_CONFIG_ERROR",
            Self::IoError => "FEEDLOADER_CLI_IO_ERROR",
            Self::AlreadyInitialized => "FEEDLOADER_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "FEEDLOADER_CLI_NOT_INITIALIZED",
            Self::BootFailed => "FEEDLOADER_CLI_BOOT_FAILED",
            Self::AlreadyRunning => "FEEDLOADER_CLI_ALREADY_RUNNING",
            Self::CommandFailed => "FEEDLOADER_CLI_COMMAND_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Already initialized
    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    /// Not initialized
    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'feedloader init' first.",
        )
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Data directory locked by a running server or another command
    pub fn already_running(lock_path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::AlreadyRunning,
            format!(
                "Data directory is in use by another feedloader process (remove {} if none is running)",
                lock_path
            ),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<LoaderError> for CliError {
    fn from(e: LoaderError) -> Self {
        match e {
            LoaderError::DataDirLocked(path) => Self::already_running(path),
            e => Self::new(CliErrorCode::CommandFailed, e.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
