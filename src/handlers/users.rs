// src/handlers/users.rs
use crate::error::{ApiError, ApiResult};
use crate::models::drawing::DrawingRecord;
use crate::models::user::{RegisterRequest, UserResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

const MAX_USERNAME_CHARS: usize = 50;
const MIN_PASSWORD_CHARS: usize = 6;
const MAX_PASSWORD_CHARS: usize = 128;

pub fn user_routes() -> Router {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/:id/drawings", get(list_user_drawings))
}

fn validate_registration(request: &RegisterRequest) -> ApiResult<()> {
    let username = request.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ApiError::validation(format!(
            "Username must be 1 to {} characters",
            MAX_USERNAME_CHARS
        )));
    }

    let password_len = request.password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password_len) {
        return Err(ApiError::validation(format!(
            "Password must be {} to {} characters",
            MIN_PASSWORD_CHARS, MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

/// POST /api/users - Create an account; the password is stored as a bcrypt hash
async fn register(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(request) =
        payload.map_err(|_| ApiError::validation("Username and password are required"))?;
    validate_registration(&request)?;

    let username = request.username.trim().to_string();
    if state.storage.get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let cost = state.config.bcrypt_cost;
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?
        .map_err(|e| ApiError::internal("Failed to create user", e))?;

    // The store re-checks the username under its own lock.
    let user = state.storage.create_user(&username, &password_hash).await?;
    tracing::info!(user_id = user.id, "👤 User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/users/:id/drawings
async fn list_user_drawings(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<DrawingRecord>>> {
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid user ID"))?;

    if state.storage.get_user(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(state.storage.drawings_by_user(id).await?))
}
