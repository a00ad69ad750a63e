use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use petal_types::api::{
    CoverResponse, FlowerResponse, KeepAliveResponse, ProfileResponse, UpdateProfileRequest,
};
use petal_types::config::keys;

use crate::auth::AppState;
use crate::run_db;

const UNNAMED: &str = "Unnamed";
const NO_BIO: &str = "No bio yet";

/// GET /keep-alive: tiny query so a hosted database never idles out.
pub async fn keep_alive(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || db.first_config_key())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))
        .and_then(|r| r);

    match result {
        Ok(key) => (
            StatusCode::OK,
            Json(KeepAliveResponse {
                success: true,
                message: Some("Database is awake".to_string()),
                error: None,
                timestamp: Some(chrono::Utc::now()),
                data: Some(serde_json::json!({ "key": key })),
            }),
        ),
        Err(e) => {
            error!("Keep-alive ping failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(KeepAliveResponse {
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                    timestamp: None,
                    data: None,
                }),
            )
        }
    }
}

pub async fn get_cover(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let url = run_db(&state, |db| db.get_config(keys::COVER_IMAGE)).await?;
    Ok(Json(CoverResponse {
        url: url.unwrap_or_else(|| state.default_cover_url.clone()),
    }))
}

pub async fn get_profile(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    Ok(Json(load_profile(&state).await?))
}

/// PUT /site/profile: name and bio are written together.
pub async fn update_profile(
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    run_db(&state, move |db| {
        db.upsert_config_many(&[
            (keys::PROFILE_NAME, req.name.as_str()),
            (keys::PROFILE_BIO, req.bio.as_str()),
        ])
    })
    .await?;

    Ok(Json(load_profile(&state).await?))
}

pub async fn get_flowers(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let raw = run_db(&state, |db| db.get_config(keys::FLOWER_COUNT)).await?;
    let count = raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0);
    Ok(Json(FlowerResponse { count }))
}

/// POST /site/flowers: visitors send one flower per click; limiting that to
/// once a day is left to the client.
pub async fn send_flower(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let count = run_db(&state, |db| db.increment_config(keys::FLOWER_COUNT)).await?;
    Ok(Json(FlowerResponse { count }))
}

async fn load_profile(state: &AppState) -> Result<ProfileResponse, StatusCode> {
    let (name, bio, avatar) = run_db(state, |db| {
        Ok((
            db.get_config(keys::PROFILE_NAME)?,
            db.get_config(keys::PROFILE_BIO)?,
            db.get_config(keys::PROFILE_AVATAR)?,
        ))
    })
    .await?;

    Ok(ProfileResponse {
        name: name.filter(|v| !v.is_empty()).unwrap_or_else(|| UNNAMED.to_string()),
        bio: bio.filter(|v| !v.is_empty()).unwrap_or_else(|| NO_BIO.to_string()),
        avatar: avatar.unwrap_or_default(),
    })
}
