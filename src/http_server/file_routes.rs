//! File HTTP Routes
//!
//! Uploads are multipart. Recognized fields:
//!
//! - `file` (required): the payload, its filename becomes the file name
//! - `file_name`: overrides the filename of the `file` part
//! - `delimiter`: single character, defaults to the configured delimiter
//! - `column`: one per column name, in order

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::common::{bad_request, error_response, ApiError, AppState};
use crate::loader::{DataFile, Delimiter, LoaderError, UploadRequest};

/// Room for multipart framing and the small text fields
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub feed: String,
    pub user_id: String,
    pub file_name: String,
    pub path: String,
    pub display: String,
    pub upload_date: String,
    pub delimiter: String,
    pub columns: Vec<String>,
    pub size: u64,
    pub checksum: String,
}

impl FileResponse {
    pub fn from_file(file: &DataFile, feed_name: &str) -> Self {
        Self {
            id: file.id.to_string(),
            feed: feed_name.to_string(),
            user_id: file.user_id.to_string(),
            file_name: file.file_name.clone(),
            path: file.data_path.clone(),
            display: file.to_string(),
            upload_date: file.upload_date().to_rfc3339(),
            delimiter: file.delimiter().to_string(),
            columns: file.get_columns(),
            size: file.size,
            checksum: file.checksum.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FilesListResponse {
    pub files: Vec<FileResponse>,
    pub total: usize,
}

/// `/feeds/:name/files`, merged into the feed router
pub fn feed_file_routes(state: Arc<AppState>) -> Router {
    let limit = state.service.options().max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/:name/files",
            get(list_files_handler)
                .post(upload_file_handler)
                .layer(DefaultBodyLimit::max(limit)),
        )
        .with_state(state)
}

/// `/files/*`
pub fn file_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:id", get(get_file_handler).delete(delete_file_handler))
        .route("/:id/data", get(download_file_handler))
        .with_state(state)
}

fn parse_file_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| bad_request(format!("Invalid file id: {}", raw)))
}

fn content_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        "text/csv"
    } else if lower.ends_with(".txt") || lower.ends_with(".tsv") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

async fn list_files_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(feed_name): Path<String>,
) -> Result<Json<FilesListResponse>, ApiError> {
    let ctx = state.context(&headers);
    let files = state
        .service
        .list_files(&feed_name, &ctx)
        .map_err(error_response)?;

    let files: Vec<FileResponse> = files
        .iter()
        .map(|f| FileResponse::from_file(f, &feed_name))
        .collect();

    Ok(Json(FilesListResponse {
        total: files.len(),
        files,
    }))
}

async fn upload_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(feed_name): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let ctx = state.context(&headers);
    if !ctx.is_authenticated {
        return Err(error_response(LoaderError::AuthenticationRequired));
    }

    let mut payload: Option<(String, Bytes)> = None;
    let mut file_name_override: Option<String> = None;
    let mut delimiter: Option<Delimiter> = None;
    let mut columns: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
                payload = Some((file_name, data));
            }
            "file_name" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                file_name_override = Some(text);
            }
            "delimiter" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                delimiter = Some(Delimiter::new(&text).map_err(error_response)?);
            }
            "column" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                columns.push(text);
            }
            other => return Err(bad_request(format!("Unexpected field: {}", other))),
        }
    }

    let (file_name, data) = payload.ok_or_else(|| bad_request("No file provided"))?;
    let file_name = file_name_override.unwrap_or(file_name);

    let request = UploadRequest {
        feed: Some(feed_name.clone()),
        file_name,
        data: data.to_vec(),
        delimiter,
        columns,
    };

    let file = state.service.upload(request, &ctx).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(FileResponse::from_file(&file, &feed_name))))
}

async fn get_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let ctx = state.context(&headers);
    let id = parse_file_id(&id)?;

    let (file, feed) = state.service.get_file(id, &ctx).map_err(error_response)?;
    Ok(Json(FileResponse::from_file(&file, &feed.name)))
}

async fn download_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, HeaderMap, Bytes), ApiError> {
    let ctx = state.context(&headers);
    let id = parse_file_id(&id)?;

    let (file, data) = state.service.download(id, &ctx).map_err(error_response)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&file.file_name)),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.file_name)) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, response_headers, Bytes::from(data)))
}

async fn delete_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.context(&headers);
    let id = parse_file_id(&id)?;

    state.service.delete_file(id, &ctx).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("prices.CSV"), "text/csv");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("dump.bin"), "application/octet-stream");
    }
}
