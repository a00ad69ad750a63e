use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- JWT Claims --

pub const ADMIN_ROLE: &str = "admin";

/// JWT claims issued by `/auth/login` and checked by the admin middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// -- Site --

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub name: String,
    pub bio: String,
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlowerResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChallengeRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeepAliveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// -- Images --

/// Pixel-space rectangle supplied by a client that already ran its own cropper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Cropped image upload. `image` is a data URL (`data:image/png;base64,...`).
///
/// Either `crop` is given, or the rectangle is derived from the cropper view
/// (`zoom`, `pan_x`, `pan_y`) and the target's fixed aspect ratio.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageUploadRequest {
    pub image: String,
    #[serde(default)]
    pub zoom: Option<f32>,
    #[serde(default)]
    pub pan_x: Option<f64>,
    #[serde(default)]
    pub pan_y: Option<f64>,
    #[serde(default)]
    pub crop: Option<CropArea>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

// -- Notes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Categories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

// -- Guestbook --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub content: String,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
    pub content: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}
