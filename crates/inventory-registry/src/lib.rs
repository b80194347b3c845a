//! Inventory Registry Service
//!
//! Registers named inventory items with an optional description and photo.
//! Item records live in a single JSON document and photos in a sibling
//! directory, both under one data directory.
//!
//! ## Endpoints
//!
//! - `POST /register` - Register an item (multipart: `inventory_name`, `description`, `photo`)
//! - `GET /inventory` - List all items
//! - `GET /inventory/{id}` - Get an item
//! - `PUT /inventory/{id}` - Update name and/or description (JSON)
//! - `GET /inventory/{id}/photo` - Download an item's photo
//! - `PUT /inventory/{id}/photo` - Replace an item's photo (multipart: `photo`)
//! - `GET /health` - Health check

pub mod config;
pub mod handlers;
pub mod photos;
pub mod storage;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::AppState;
pub use inventory_common::{Item, ItemPatch};
pub use photos::PhotoStore;
pub use storage::RecordStore;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    let shared_state = Arc::new(state);

    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/register", post(handlers::register_handler))
        .route("/inventory", get(handlers::list_items_handler))
        .route(
            "/inventory/{id}",
            get(handlers::get_item_handler).put(handlers::update_item_handler),
        )
        .route(
            "/inventory/{id}/photo",
            get(handlers::get_photo_handler).put(handlers::replace_photo_handler),
        )
        .layer(body_limit);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
