//! # Loader Errors

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Feed, column and file errors
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    // Constraint errors
    #[error("{entity} already exists: {name}")]
    UniquenessViolation { entity: &'static str, name: String },

    #[error("Missing required reference: {0}")]
    MissingRequiredReference(&'static str),

    // Validation errors
    #[error("User {user_id} is not authorized to upload to feed '{feed}'")]
    Unauthorized { user_id: Uuid, feed: String },

    #[error("Delimiter must be exactly one character, got {0:?}")]
    MalformedDelimiter(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Invalid column name: {0:?}")]
    InvalidColumnName(String),

    // Access errors
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Administrator privileges required")]
    AdminRequired,

    // Lookup errors
    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    // State errors
    #[error("Feed still has files: {0}")]
    FeedNotEmpty(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error(transparent)]
    Auth(#[from] AuthError),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Data directory is in use by another process (lock file {0})")]
    DataDirLocked(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoaderError {
    pub(crate) fn duplicate_feed(name: impl Into<String>) -> Self {
        LoaderError::UniquenessViolation {
            entity: "Feed",
            name: name.into(),
        }
    }

    pub(crate) fn duplicate_column(name: impl Into<String>) -> Self {
        LoaderError::UniquenessViolation {
            entity: "Column",
            name: name.into(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        LoaderError::Internal("Lock poisoned".into())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            LoaderError::UniquenessViolation { .. } => 409,
            LoaderError::MissingRequiredReference(_) => 400,
            LoaderError::Unauthorized { .. } => 403,
            LoaderError::MalformedDelimiter(_) => 400,
            LoaderError::InvalidName(_) => 400,
            LoaderError::InvalidColumnName(_) => 400,
            LoaderError::AuthenticationRequired => 401,
            LoaderError::AdminRequired => 403,
            LoaderError::FeedNotFound(_) => 404,
            LoaderError::ColumnNotFound(_) => 404,
            LoaderError::FileNotFound(_) => 404,
            LoaderError::UserNotFound(_) => 404,
            LoaderError::FeedNotEmpty(_) => 409,
            LoaderError::FileAlreadyExists(_) => 409,
            LoaderError::FileTooLarge(_, _) => 413,
            LoaderError::Auth(e) => e.status_code(),
            LoaderError::Io(_) => 500,
            LoaderError::Catalog(_) => 500,
            LoaderError::DataDirLocked(_) => 503,
            LoaderError::Internal(_) => 500,
        }
    }

    /// Whether the caller can fix this by correcting their input
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            LoaderError::MissingRequiredReference(_)
                | LoaderError::Unauthorized { .. }
                | LoaderError::MalformedDelimiter(_)
                | LoaderError::InvalidName(_)
                | LoaderError::InvalidColumnName(_)
        )
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(e: std::io::Error) -> Self {
        LoaderError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LoaderError::duplicate_feed("f").status_code(), 409);
        assert_eq!(LoaderError::MissingRequiredReference("user").status_code(), 400);
        assert_eq!(LoaderError::FileTooLarge(100, 50).status_code(), 413);
        assert_eq!(LoaderError::Auth(AuthError::InvalidCredentials).status_code(), 401);
        assert_eq!(LoaderError::poisoned().status_code(), 500);
    }

    #[test]
    fn test_authorization_is_a_validation_error() {
        let err = LoaderError::Unauthorized {
            user_id: Uuid::new_v4(),
            feed: "test_feed".into(),
        };
        assert!(err.is_validation_error());
        assert!(err.is_client_error());
        assert!(!LoaderError::Io("disk".into()).is_validation_error());
    }

    #[test]
    fn test_uniqueness_message_names_entity() {
        let err = LoaderError::duplicate_column("price");
        assert_eq!(err.to_string(), "Column already exists: price");
    }
}
