// src/handlers/catalog.rs
//! Read-only browsing of the tutorial catalog.

use crate::catalog::{CategorySummary, ItemSummary, TutorialDetail};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn catalog_routes() -> Router {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/category/:id", get(list_category_items))
        .route("/api/tutorial/:category_id/:drawing_id", get(get_tutorial))
}

/// GET /api/categories
async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Vec<CategorySummary>> {
    Json(state.library.categories())
}

/// GET /api/category/:id - Unknown and empty categories are both 404
async fn list_category_items(
    Path(category_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<ItemSummary>>> {
    let items = state.library.items_in_category(&category_id);
    if items.is_empty() {
        return Err(ApiError::not_found("Category not found or empty"));
    }
    Ok(Json(items))
}

/// GET /api/tutorial/:category_id/:drawing_id
async fn get_tutorial(
    Path((category_id, drawing_id)): Path<(String, String)>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<TutorialDetail>> {
    state
        .library
        .tutorial(&category_id, &drawing_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Tutorial not found"))
}
