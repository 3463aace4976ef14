// lib.rs - Draw What You See: keyword-matched drawing tutorials over HTTP
pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod storage;

use axum::{response::Json, routing::get, Extension, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use catalog::DrawingLibrary;
use config::Config;
use error::{ApiError, ApiResult};
use storage::SharedStorage;

// AppState holds the read-only tutorial catalog, the record store and the runtime configuration
pub struct AppState {
    pub library: DrawingLibrary,
    pub storage: SharedStorage,
    pub config: Config,
}

impl AppState {
    pub fn new(library: DrawingLibrary, storage: SharedStorage, config: Config) -> Self {
        Self {
            library,
            storage,
            config,
        }
    }
}

/// Build the application with all routes, middleware and shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(handlers::drawing::drawing_routes(state.config.max_upload_bytes))
        .merge(handlers::catalog::catalog_routes())
        .merge(handlers::users::user_routes())
        .route("/api/status", get(api_status))
        .nest_service("/assets", ServeDir::new(&state.config.assets_dir));

    // Single-page client bundle, with index.html for client-side routes
    if let Some(public_dir) = &state.config.public_dir {
        let index = ServeFile::new(public_dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(public_dir).fallback(index));
    }

    app.layer(axum::middleware::from_fn(
        middleware::logging::request_logging_middleware,
    ))
    .layer(CorsLayer::permissive())
    .layer(Extension(state))
}

/// GET /api/status
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let drawings = state
        .storage
        .drawing_count()
        .await
        .map_err(|e| ApiError::internal("Failed to read status", e))?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "categories": state.library.categories.len(),
        "drawings": drawings,
    })))
}
