//! # Auth Errors

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already registered: {0}")]
    UsernameAlreadyExists(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Internal error: password hashing failed")]
    HashingFailed,

    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidUsername(_) => 400,
            AuthError::WeakPassword(_) => 400,
            AuthError::MalformedToken => 400,

            AuthError::InvalidCredentials => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidSignature => 401,

            AuthError::UsernameAlreadyExists(_) => 409,

            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::UsernameAlreadyExists("a".into()).status_code(), 409);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
        assert!(AuthError::TokenExpired.is_client_error());
    }

    #[test]
    fn test_invalid_credentials_is_generic() {
        let msg = AuthError::InvalidCredentials.to_string();
        assert!(!msg.contains("password"));
        assert!(!msg.contains("user"));
    }
}
