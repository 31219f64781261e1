//! Authentication HTTP Routes

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{error_response, ApiError, AppState};
use crate::auth::{TokenResponse, User};
use crate::loader::LoaderError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
        .route("/users", get(list_users_handler).post(create_user_handler))
        .with_state(state)
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .service
        .authenticate(&request.username, &request.password)
        .map_err(error_response)?;

    let token = state
        .jwt
        .generate_access_token(&user)
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(TokenResponse::new(token, state.jwt.get_expiration())))
}

async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let ctx = state.context(&headers);
    let user_id = ctx
        .user_id
        .ok_or_else(|| error_response(LoaderError::AuthenticationRequired))?;

    let user = state.service.get_user(user_id).map_err(error_response)?;
    Ok(Json(UserResponse::from(&user)))
}

async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let ctx = state.context(&headers);
    let users = state.service.list_users(&ctx).map_err(error_response)?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let ctx = state.context(&headers);
    let user = state
        .service
        .register_user(
            &request.username,
            &request.email,
            &request.password,
            request.is_admin,
            &ctx,
        )
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}
