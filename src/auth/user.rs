//! # Users
//!
//! Accounts that can log in and be attached to feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};

const MAX_USERNAME_LEN: usize = 150;

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Login name (unique)
    pub username: String,

    pub email: String,

    /// Administrators manage feeds, columns and users
    #[serde(default)]
    pub is_admin: bool,

    /// Argon2id hash, never plaintext
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        password: &str,
        policy: &PasswordPolicy,
    ) -> AuthResult<Self> {
        validate_username(&username)?;
        policy.validate(password)?;

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            is_admin: false,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }
}

fn validate_username(username: &str) -> AuthResult<()> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '@' | '+'));

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidUsername(username.to_string()))
    }
}

/// Storage for user accounts
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Fails with `UsernameAlreadyExists` on a duplicate username
    fn create(&self, user: &User) -> AuthResult<()>;

    /// Remove an account, returning whether it existed
    fn delete(&self, id: Uuid) -> AuthResult<bool>;

    fn list(&self) -> AuthResult<Vec<User>>;
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AuthError {
    AuthError::StorageError("Lock poisoned".to_string())
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameAlreadyExists(user.username.clone()));
        }

        users.push(user.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> AuthResult<bool> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    fn list(&self) -> AuthResult<Vec<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.clone())
    }
}
