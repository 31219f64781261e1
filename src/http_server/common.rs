//! Shared handler plumbing: application state, caller identity and error
//! responses.

use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::auth::{JwtManager, RequestContext};
use crate::loader::{LoaderError, LoaderService, LocalBackend};
use crate::observability::{Event, Logger};

/// State shared by every handler
#[derive(Debug)]
pub struct AppState {
    pub service: LoaderService<LocalBackend>,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(service: LoaderService<LocalBackend>, jwt: JwtManager) -> Self {
        Self { service, jwt }
    }

    /// Identity of the caller. A missing or invalid bearer token means
    /// anonymous.
    pub fn context(&self, headers: &HeaderMap) -> RequestContext {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.jwt.context_for(token.trim()).ok())
            .unwrap_or_else(RequestContext::anonymous)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(err: LoaderError) -> ApiError {
    let code = err.status_code();
    if !err.is_client_error() {
        Logger::error(Event::RequestFailed.as_str(), &[("error", &err.to_string())]);
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            error: err.to_string(),
            code,
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            code: 400,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, User};
    use crate::loader::ServiceOptions;
    use tempfile::TempDir;

    fn state(temp: &TempDir) -> AppState {
        let service = LoaderService::new(
            LocalBackend::new(temp.path().to_path_buf()),
            ServiceOptions::default(),
        );
        AppState::new(service, JwtManager::new(JwtConfig::default()))
    }

    #[test]
    fn test_bearer_token_becomes_context() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);
        let user = User::new(
            "alice".to_string(),
            String::new(),
            "password123",
            &Default::default(),
        )
        .unwrap();
        let token = state.jwt.generate_access_token(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());

        let ctx = state.context(&headers);
        assert!(ctx.is_user(&user.id));
        assert!(!ctx.is_admin);
    }

    #[test]
    fn test_garbage_token_is_anonymous() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(!state.context(&headers).is_authenticated);
        assert!(!state.context(&HeaderMap::new()).is_authenticated);
    }

    #[test]
    fn test_error_response_status() {
        let (status, Json(body)) = error_response(LoaderError::FeedNotFound("prices".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, 404);
    }
}
