//! Column HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{bad_request, error_response, ApiError, AppState};
use crate::loader::{Column, ColumnType};

#[derive(Debug, Serialize)]
pub struct ColumnResponse {
    pub id: String,
    pub name: String,
    pub col_type: ColumnType,
    pub created_at: String,
}

impl From<&Column> for ColumnResponse {
    fn from(column: &Column) -> Self {
        Self {
            id: column.id.to_string(),
            name: column.name.clone(),
            col_type: column.col_type,
            created_at: column.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateColumnRequest {
    pub name: String,
    #[serde(default)]
    pub col_type: Option<String>,
}

pub fn column_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_columns_handler).post(create_column_handler))
        .route("/:name", get(get_column_handler).delete(delete_column_handler))
        .with_state(state)
}

async fn list_columns_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ColumnResponse>>, ApiError> {
    let ctx = state.context(&headers);
    let columns = state.service.list_columns(&ctx).map_err(error_response)?;
    Ok(Json(columns.iter().map(ColumnResponse::from).collect()))
}

async fn create_column_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<ColumnResponse>), ApiError> {
    let ctx = state.context(&headers);
    let col_type = match request.col_type.as_deref() {
        Some(raw) => raw.parse::<ColumnType>().map_err(bad_request)?,
        None => ColumnType::default(),
    };

    let column = state
        .service
        .create_column(&request.name, col_type, &ctx)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ColumnResponse::from(&column))))
}

async fn get_column_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<ColumnResponse>, ApiError> {
    let ctx = state.context(&headers);
    let column = state.service.get_column(&name, &ctx).map_err(error_response)?;
    Ok(Json(ColumnResponse::from(&column)))
}

async fn delete_column_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.context(&headers);
    state.service.delete_column(&name, &ctx).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
