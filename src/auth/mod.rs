//! # Authentication
//!
//! User accounts, password hashing and JWT access tokens.

pub mod context;
pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod user;

pub use context::RequestContext;
pub use crypto::PasswordPolicy;
pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager, TokenResponse};
pub use user::{InMemoryUserRepository, User, UserRepository};
