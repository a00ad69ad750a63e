use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use petal_types::api::Claims;

use crate::auth::AppState;

/// Reject requests that do not carry a valid admin JWT.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = bearer_claims(req.headers(), &state.jwt_secret).ok_or(StatusCode::UNAUTHORIZED)?;
    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extract and validate a JWT from the Authorization header, if present.
pub fn bearer_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;
    use axum::http::HeaderValue;

    #[test]
    fn reads_valid_bearer_token() {
        let (token, _) = create_token("s3cret", "owner").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(bearer_claims(&headers, "s3cret").unwrap().sub, "owner");
        assert!(bearer_claims(&headers, "other-secret").is_none());
    }

    #[test]
    fn missing_or_malformed_header() {
        let mut headers = HeaderMap::new();
        assert!(bearer_claims(&headers, "s3cret").is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_claims(&headers, "s3cret").is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"));
        assert!(bearer_claims(&headers, "s3cret").is_none());
    }
}
