//! API request handlers for the inventory registry

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, Request, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inventory_common::{Error, Item, ItemPatch};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info, warn};

use crate::{photos::PhotoStore, storage::RecordStore, upload::UploadForm};

/// Default cap on request bodies, which bounds photo uploads
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    /// Record document. The lock serializes every read-modify-write cycle.
    pub records: Mutex<RecordStore>,
    pub photos: PhotoStore,
    /// Directory served for routes the API does not handle
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create state for a data directory holding `inventory.json` and `photos/`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();

        Self {
            records: Mutex::new(RecordStore::new(&data_dir)),
            photos: PhotoStore::new(&data_dir),
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Create the data layout on disk
    pub async fn init(&self) -> inventory_common::Result<()> {
        self.records.lock().await.init().await?;
        self.photos.init().await?;
        Ok(())
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => ApiError::bad_request(message),
            Error::NotFound(message) => ApiError::not_found(message),
            other => {
                error!("Request failed: {}", other);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err).into()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

fn item_not_found(id: &str) -> ApiError {
    ApiError::not_found(format!("Item not found: {}", id))
}

/// Delete a photo that no record will reference, logging instead of failing
async fn discard_photo(photos: &PhotoStore, filename: &str) {
    if let Err(e) = photos.delete(filename).await {
        warn!("Failed to remove photo {}: {}", filename, e);
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "inventory-registry"
    }))
}

/// Register a new item from a multipart form
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let mut form = UploadForm::read(multipart?).await?;

    let name = form
        .take_text("inventory_name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::validation("inventory_name is required"))?;
    let description = form.take_text("description");

    info!("Registering item: {}", name);

    let photo = match form.photo.take() {
        Some(upload) => Some(
            state
                .photos
                .save(&upload.bytes, upload.filename.as_deref())
                .await?,
        ),
        None => None,
    };

    let item = Item::new(name, description, photo.clone());

    let mut records = state.records.lock().await;
    match records.insert(item).await {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(e) => {
            if let Some(photo) = &photo {
                discard_photo(&state.photos, photo).await;
            }
            Err(e.into())
        }
    }
}

/// List every item in creation order
pub async fn list_items_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Item>>, ApiError> {
    info!("Listing all items");

    let records = state.records.lock().await;
    let items = records.load().await?;

    Ok(Json(items))
}

/// Get item by ID
pub async fn get_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    info!("Getting item: {}", id);

    let records = state.records.lock().await;
    let item = records.get(&id).await?;

    match item {
        Some(item) => Ok(Json(item)),
        None => Err(item_not_found(&id)),
    }
}

/// Update an item's name and/or description
pub async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    info!("Updating item: {}", id);

    // Unknown ids are reported before the body is judged
    let mut records = state.records.lock().await;
    if records.get(&id).await?.is_none() {
        return Err(item_not_found(&id));
    }

    let Json(patch) = payload?;
    let updated = records.update(&id, patch).await?;

    match updated {
        Some(item) => Ok(Json(item)),
        None => Err(item_not_found(&id)),
    }
}

/// Serve an item's photo with a content type derived from its extension
pub async fn get_photo_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    info!("Getting photo for item: {}", id);

    let item = {
        let records = state.records.lock().await;
        let item = records.get(&id).await?;
        item.ok_or_else(|| item_not_found(&id))?
    };

    let photo = item
        .photo
        .ok_or_else(|| ApiError::not_found(format!("Item has no photo: {}", id)))?;

    let path = state
        .photos
        .resolve_path(&photo)
        .ok_or_else(|| photo_file_not_found(&id, &photo))?;

    serve_photo(path, request)
        .await
        .map_err(|_| photo_file_not_found(&id, &photo))
}

fn photo_file_not_found(id: &str, photo: &str) -> ApiError {
    warn!("Photo file missing for item {}: {}", id, photo);
    ApiError::not_found(format!("Photo file not found: {}", photo))
}

/// Stream a stored file. A file missing at read time comes back as `Err(path)`.
async fn serve_photo(path: PathBuf, request: Request) -> Result<Response, PathBuf> {
    let response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        return Err(path);
    }

    Ok(response.map(Body::new))
}

/// Replace an item's photo, removing the file it referenced before
pub async fn replace_photo_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Item>, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;
    let upload = form
        .photo
        .take()
        .ok_or_else(|| Error::validation("photo file is required"))?;

    info!("Replacing photo for item: {}", id);

    let mut records = state.records.lock().await;
    if records.get(&id).await?.is_none() {
        return Err(item_not_found(&id));
    }

    let filename = state
        .photos
        .save(&upload.bytes, upload.filename.as_deref())
        .await?;

    let (item, previous) = match records.set_photo(&id, filename.clone()).await {
        Ok(Some(change)) => change,
        Ok(None) => {
            discard_photo(&state.photos, &filename).await;
            return Err(item_not_found(&id));
        }
        Err(e) => {
            discard_photo(&state.photos, &filename).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.filter(|previous| *previous != filename) {
        discard_photo(&state.photos, &previous).await;
    }

    Ok(Json(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_request() -> Request {
        Request::builder()
            .uri("/inventory/1/photo")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_serve_photo_reports_vanished_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");

        let result = serve_photo(path.clone(), photo_request()).await;

        assert_eq!(result.unwrap_err(), path);
    }

    #[tokio::test]
    async fn test_serve_photo_streams_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("here.png");
        std::fs::write(&path, b"png").unwrap();

        let response = serve_photo(path, photo_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
    }

    #[test]
    fn test_rejections_keep_status() {
        let err: ApiError = Error::validation("inventory_name is required").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = Error::Io(std::io::Error::other("disk full")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
