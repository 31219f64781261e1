//! # JWT Access Tokens
//!
//! Stateless HS256 tokens carrying the user id and admin flag.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::RequestContext;
use super::errors::{AuthError, AuthResult};
use super::user::User;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: Duration,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string(),
            access_token_ttl: Duration::minutes(60),
            issuer: "feedloader".to_string(),
            audience: "feedloader".to_string(),
        }
    }
}

/// Issues and validates access tokens
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        let now = Utc::now();
        let exp = now + self.config.access_token_ttl;

        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            admin: user.is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate a token and turn its claims into a request context
    pub fn context_for(&self, token: &str) -> AuthResult<RequestContext> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::MalformedToken)?;

        Ok(if claims.admin {
            RequestContext::admin(user_id)
        } else {
            RequestContext::authenticated(user_id)
        })
    }

    pub fn get_expiration(&self) -> DateTime<Utc> {
        Utc::now() + self.config.access_token_ttl
    }
}

/// Token response returned to client
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: (expires_at - Utc::now()).num_seconds(),
            expires_at: expires_at.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::PasswordPolicy;

    fn create_test_manager() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "test_secret_key_for_testing_only".to_string(),
            ..JwtConfig::default()
        })
    }

    fn create_test_user() -> User {
        User::new(
            "good".to_string(),
            "good@example.com".to_string(),
            "password",
            &PasswordPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_token_round_trip() {
        let manager = create_test_manager();
        let user = create_test_user();

        let token = manager.generate_access_token(&user).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "good");
        assert!(!claims.admin);
    }

    #[test]
    fn test_context_for_admin() {
        let manager = create_test_manager();
        let mut user = create_test_user();
        user.is_admin = true;

        let token = manager.generate_access_token(&user).unwrap();
        let ctx = manager.context_for(&token).unwrap();
        assert_eq!(ctx.user_id, Some(user.id));
        assert!(ctx.is_admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = JwtManager::new(JwtConfig {
            secret: "another_secret_entirely".to_string(),
            ..JwtConfig::default()
        });
        let token = create_test_manager()
            .generate_access_token(&create_test_user())
            .unwrap();

        assert!(matches!(other.validate_token(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_rejected() {
        let manager = create_test_manager();
        assert!(manager.context_for("not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new(JwtConfig {
            secret: "test_secret".to_string(),
            access_token_ttl: Duration::hours(-2),
            ..JwtConfig::default()
        });

        let token = manager.generate_access_token(&create_test_user()).unwrap();
        assert!(matches!(manager.validate_token(&token), Err(AuthError::TokenExpired)));
    }
}
