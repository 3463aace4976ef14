// src/handlers/drawing.rs
//! Drawing submissions (text prompt or uploaded image) and record lookup.

use crate::analysis::{analyze_drawing, to_data_url};
use crate::error::{ApiError, ApiResult};
use crate::models::drawing::{
    DrawingRecord, ImageDrawingResponse, InputType, NewDrawing, TextDrawingRequest,
    TextDrawingResponse,
};
use crate::AppState;
use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Extension, Path,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub const MAX_PROMPT_CHARS: usize = 500;

/// Room for multipart boundaries and the non-file fields on top of the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn drawing_routes(max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/drawing/text", post(create_from_text))
        .route(
            "/api/drawing/image",
            post(create_from_image)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/api/drawing/:id", get(get_drawing))
}

/// Prompts are 1..=500 long. Length is counted in UTF-16 code units, the way
/// browser clients measure `string.length`, so an emoji counts as two.
pub fn validate_prompt(prompt: &str) -> ApiResult<()> {
    let len = prompt.encode_utf16().count();
    if len == 0 || len > MAX_PROMPT_CHARS {
        return Err(ApiError::validation("Invalid prompt"));
    }
    Ok(())
}

async fn ensure_user_exists(state: &AppState, user_id: Option<u64>) -> ApiResult<()> {
    if let Some(id) = user_id {
        let user = state
            .storage
            .get_user(id)
            .await
            .map_err(|e| ApiError::internal("Failed to look up user", e))?;
        if user.is_none() {
            return Err(ApiError::validation(format!("Unknown user {}", id)));
        }
    }
    Ok(())
}

/// POST /api/drawing/text - Match a prompt to a tutorial and record it
async fn create_from_text(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TextDrawingRequest>, JsonRejection>,
) -> ApiResult<Json<TextDrawingResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected text drawing body: {}", rejection);
        ApiError::validation("Invalid prompt")
    })?;
    validate_prompt(&request.prompt)?;
    ensure_user_exists(&state, request.user_id).await?;

    let tutorial = state.library.find_tutorial(&request.prompt);
    let steps = tutorial.steps.to_vec();
    let final_image_url = tutorial.final_image_url.to_string();
    tracing::info!(
        matched = tutorial.item.map(|item| item.id.as_str()).unwrap_or("default"),
        "🖍️ Text prompt matched"
    );

    let drawing = state
        .storage
        .create_drawing(NewDrawing {
            user_id: request.user_id,
            prompt: Some(request.prompt),
            input_type: InputType::Text,
            input_image_url: None,
            output_image_url: Some(final_image_url.clone()),
            steps: steps.clone(),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to generate drawing", e))?;

    Ok(Json(TextDrawingResponse {
        drawing_id: drawing.id,
        steps,
        final_image_url,
    }))
}

struct ImageUpload {
    mime: String,
    bytes: Vec<u8>,
}

fn image_too_large(max_upload_bytes: usize) -> ApiError {
    let limit = if max_upload_bytes >= 1024 * 1024 {
        format!("{} MB", max_upload_bytes / (1024 * 1024))
    } else {
        format!("{} KB", max_upload_bytes / 1024)
    };
    ApiError::validation(format!("Image must be at most {}", limit))
}

/// Bodies cut off by the size limit are an oversized image, not a transport error.
fn upload_error(err: MultipartError, max_upload_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        image_too_large(max_upload_bytes)
    } else {
        ApiError::validation(format!("Invalid upload: {}", err.body_text()))
    }
}

/// Pull the `image` file and the optional `userId` field out of the form.
async fn read_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> ApiResult<(ImageUpload, Option<u64>)> {
    let mut image = None;
    let mut user_id = None;
    let field_error = |err| upload_error(err, max_upload_bytes);

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(field_error)?;
                image = Some(ImageUpload {
                    mime,
                    bytes: bytes.to_vec(),
                });
            }
            Some("userId") => {
                let raw = field.text().await.map_err(field_error)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = raw
                        .parse::<u64>()
                        .map_err(|_| ApiError::validation("Invalid user ID"))?;
                    user_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::validation("No image uploaded"))?;

    if !image.mime.starts_with("image/") {
        tracing::warn!("Rejected upload with content type '{}'", image.mime);
        return Err(ApiError::validation("Only image files can be uploaded"));
    }
    if image.bytes.is_empty() {
        return Err(ApiError::validation("Uploaded image is empty"));
    }
    if image.bytes.len() > max_upload_bytes {
        return Err(image_too_large(max_upload_bytes));
    }

    Ok((image, user_id))
}

/// POST /api/drawing/image - "Analyze" an uploaded drawing and record it
async fn create_from_image(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ImageDrawingResponse>> {
    let multipart = multipart.map_err(|_| ApiError::validation("No image uploaded"))?;
    let (image, user_id) = read_upload(multipart, state.config.max_upload_bytes).await?;
    ensure_user_exists(&state, user_id).await?;

    let analysis = analyze_drawing(&image.bytes);
    let tutorial = state.library.find_tutorial(&analysis.subject);
    let steps = tutorial.steps.to_vec();
    let final_image_url = tutorial.final_image_url.to_string();
    let input_image_url = to_data_url(&image.mime, &image.bytes);

    tracing::info!(
        bytes = image.bytes.len(),
        mime = %image.mime,
        "🖼️ Image drawing received"
    );

    let drawing = state
        .storage
        .create_drawing(NewDrawing {
            user_id,
            prompt: Some(analysis.description.clone()),
            input_type: InputType::Image,
            input_image_url: Some(input_image_url.clone()),
            output_image_url: Some(final_image_url.clone()),
            steps: steps.clone(),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to process image", e))?;

    Ok(Json(ImageDrawingResponse {
        drawing_id: drawing.id,
        description: analysis.description,
        subject: analysis.subject,
        steps,
        final_image_url,
        input_image_url,
    }))
}

/// GET /api/drawing/:id - Fetch a stored drawing record
async fn get_drawing(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<DrawingRecord>> {
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid drawing ID"))?;

    state
        .storage
        .get_drawing(id)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve drawing", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Drawing not found"))
}
