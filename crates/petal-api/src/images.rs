use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use petal_media::data_url::decode_data_url;
use petal_media::{CropRect, CropSelection, ImageTarget, Pan, TracingNotifier, UploadError};
use petal_types::api::{ImageUploadRequest, ImageUploadResponse};

use crate::auth::AppState;

/// POST /site/cover/image
pub async fn upload_cover(
    State(state): State<AppState>,
    Json(req): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, StatusCode> {
    run_upload(&state, ImageTarget::Cover, req).await
}

/// POST /site/avatar/image
pub async fn upload_avatar(
    State(state): State<AppState>,
    Json(req): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, StatusCode> {
    run_upload(&state, ImageTarget::Avatar, req).await
}

/// POST /notes/cover-image: the returned URL goes into the note being written.
pub async fn upload_note_cover(
    State(state): State<AppState>,
    Json(req): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, StatusCode> {
    run_upload(&state, ImageTarget::NoteCover, req).await
}

async fn run_upload(
    state: &AppState,
    target: ImageTarget,
    req: ImageUploadRequest,
) -> Result<Json<ImageUploadResponse>, StatusCode> {
    let source = decode_data_url(&req.image).map_err(|e| {
        warn!("Rejected {} upload: {}", target.prefix(), e);
        StatusCode::BAD_REQUEST
    })?;
    if !source.is_image() {
        warn!("Rejected {} upload: content type {}", target.prefix(), source.mime);
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    let selection = match req.crop {
        Some(c) => CropSelection::Rect(CropRect::new(c.x, c.y, c.width, c.height)),
        None => CropSelection::View {
            zoom: req.zoom.unwrap_or(1.0),
            pan: Pan {
                x: req.pan_x.unwrap_or(0.0),
                y: req.pan_y.unwrap_or(0.0),
            },
        },
    };

    let uploaded = state
        .uploader
        .process(target, source.bytes, selection, &TracingNotifier)
        .await
        .map_err(|e| match e {
            UploadError::Crop(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::Storage(_) => StatusCode::BAD_GATEWAY,
            UploadError::Persist { .. } | UploadError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    Ok(Json(ImageUploadResponse {
        url: uploaded.url,
        width: uploaded.width,
        height: uploaded.height,
    }))
}
