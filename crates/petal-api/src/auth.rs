use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use petal_db::Database;
use petal_media::{AnyObjectStore, ImageUploader};
use petal_types::api::{ADMIN_ROLE, Claims, LoginRequest, LoginResponse};

/// Admin tokens stay valid this long.
const TOKEN_TTL_DAYS: i64 = 30;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub admin: AdminCredentials,
    pub uploader: ImageUploader<AnyObjectStore, Database>,
    pub default_cover_url: String,
}

/// The single site administrator. Without a password hash nobody can log in.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let username = req.username.trim();
    let password = req.password.trim();

    let Some(stored_hash) = state.admin.password_hash.as_deref() else {
        warn!("Admin login attempted but no password hash is configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if username != state.admin.username {
        warn!("Admin login rejected: unknown username");
        return Err(StatusCode::UNAUTHORIZED);
    }

    // Verify password
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("Admin login rejected: wrong password");
            StatusCode::UNAUTHORIZED
        })?;

    let (token, expires_at) = create_token(&state.jwt_secret, username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("Admin {} logged in", username);
    Ok(Json(LoginResponse {
        username: username.to_string(),
        token,
        expires_at,
    }))
}

/// Argon2id PHC string for `password`, suitable for `PETAL_ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.trim().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn create_token(secret: &str, username: &str) -> anyhow::Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS);
    let claims = Claims {
        sub: username.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("  correct horse  ").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[test]
    fn token_carries_admin_role() {
        let (token, expires_at) = create_token("test-secret", "owner").unwrap();
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(b"test-secret"),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "owner");
        assert!(data.claims.is_admin());
        assert_eq!(data.claims.exp, expires_at.timestamp() as usize);
    }
}
