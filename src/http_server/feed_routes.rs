//! Feed HTTP Routes
//!
//! Feed management and membership. File routes nested under a feed live in
//! `file_routes`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{bad_request, error_response, ApiError, AppState};
use super::file_routes::feed_file_routes;
use crate::loader::Feed;

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub id: String,
    pub name: String,
    pub users: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Feed> for FeedResponse {
    fn from(feed: &Feed) -> Self {
        let mut users: Vec<String> = feed.users.iter().map(Uuid::to_string).collect();
        users.sort();

        Self {
            id: feed.id.to_string(),
            name: feed.name.clone(),
            users,
            created_at: feed.created_at.to_rfc3339(),
            updated_at: feed.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedsListResponse {
    pub feeds: Vec<FeedResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub user_id: String,
}

pub fn feed_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_feeds_handler).post(create_feed_handler))
        .route("/:name", get(get_feed_handler).delete(delete_feed_handler))
        .route("/:name/users", post(add_user_handler))
        .route("/:name/users/:user_id", delete(remove_user_handler))
        .with_state(state.clone())
        .merge(feed_file_routes(state))
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| bad_request(format!("Invalid user id: {}", raw)))
}

async fn list_feeds_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<FeedsListResponse>, ApiError> {
    let ctx = state.context(&headers);
    let feeds = state.service.list_feeds(&ctx).map_err(error_response)?;
    let feeds: Vec<FeedResponse> = feeds.iter().map(FeedResponse::from).collect();

    Ok(Json(FeedsListResponse {
        total: feeds.len(),
        feeds,
    }))
}

async fn create_feed_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateFeedRequest>,
) -> Result<(StatusCode, Json<FeedResponse>), ApiError> {
    let ctx = state.context(&headers);
    let feed = state
        .service
        .create_feed(&request.name, &ctx)
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(FeedResponse::from(&feed))))
}

async fn get_feed_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<FeedResponse>, ApiError> {
    let ctx = state.context(&headers);
    let feed = state.service.get_feed(&name, &ctx).map_err(error_response)?;
    Ok(Json(FeedResponse::from(&feed)))
}

async fn delete_feed_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.context(&headers);
    state.service.delete_feed(&name, &ctx).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(request): Json<AddUserRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let ctx = state.context(&headers);
    let user_id = parse_user_id(&request.user_id)?;

    let feed = state
        .service
        .add_feed_user(&name, user_id, &ctx)
        .map_err(error_response)?;
    Ok(Json(FeedResponse::from(&feed)))
}

async fn remove_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((name, user_id)): Path<(String, String)>,
) -> Result<Json<FeedResponse>, ApiError> {
    let ctx = state.context(&headers);
    let user_id = parse_user_id(&user_id)?;

    let feed = state
        .service
        .remove_feed_user(&name, user_id, &ctx)
        .map_err(error_response)?;
    Ok(Json(FeedResponse::from(&feed)))
}
