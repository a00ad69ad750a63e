use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use petal_db::models::MessageRow;
use petal_types::api::{ChallengeResponse, MessageResponse, PostMessageRequest, UpdateChallengeRequest};
use petal_types::config::keys;

use crate::auth::AppState;
use crate::middleware::bearer_claims;
use crate::{parse_db_timestamp, run_db};

const MOODS: &[&str] = &[
    "Quiet", "Sleepy", "Curious", "Gentle", "Wandering", "Sunny", "Misty", "Brave", "Humble",
    "Drowsy",
];

const THINGS: &[&str] = &[
    "Fern", "Moss", "Willow", "Sparrow", "Pebble", "Maple", "Otter", "Lantern", "Cloud", "Acorn",
];

/// Display name for an anonymous guestbook entry, e.g. "Misty Otter 42".
pub fn generate_nickname<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mood = MOODS.choose(rng).copied().unwrap_or("Quiet");
    let thing = THINGS.choose(rng).copied().unwrap_or("Fern");
    format!("{} {} {}", mood, thing, rng.random_range(10..100))
}

pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let rows = run_db(&state, |db| db.list_messages()).await?;
    let messages: Vec<MessageResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(messages))
}

/// GET /messages/challenge: the question visitors must answer. The answer
/// itself never leaves the server.
pub async fn get_challenge(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let question = run_db(&state, |db| db.get_config(keys::SECURITY_QUESTION)).await?;
    Ok(Json(ChallengeResponse { question }))
}

pub async fn update_challenge(
    State(state): State<AppState>,
    Json(req): Json<UpdateChallengeRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let question = req.question.clone();
    run_db(&state, move |db| {
        db.upsert_config_many(&[
            (keys::SECURITY_QUESTION, req.question.as_str()),
            (keys::SECURITY_ANSWER, req.answer.as_str()),
        ])
    })
    .await?;

    info!("Guestbook challenge updated");
    Ok(Json(ChallengeResponse {
        question: Some(question),
    }))
}

/// POST /messages: visitors must answer the challenge; admins skip it.
pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let is_admin = bearer_claims(&headers, &state.jwt_secret).is_some_and(|c| c.is_admin());
    if !is_admin {
        let expected = run_db(&state, |db| db.get_config(keys::SECURITY_ANSWER))
            .await?
            .unwrap_or_default();
        let given = req.answer.unwrap_or_default();
        if given.trim() != expected.trim() {
            warn!("Guestbook post rejected: wrong challenge answer");
            return Err(StatusCode::FORBIDDEN);
        }
    }

    let nickname = generate_nickname(&mut rand::rng());
    let row = run_db(&state, move |db| db.insert_message(&content, &nickname)).await?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    if run_db(&state, move |db| db.delete_message(message_id)).await? {
        info!("Message {} deleted", message_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

fn to_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        created_at: parse_db_timestamp(&row.created_at, row.id),
        id: row.id,
        content: row.content,
        nickname: row.nickname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn nicknames_have_three_parts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let nick = generate_nickname(&mut rng);
            let parts: Vec<&str> = nick.split(' ').collect();
            assert_eq!(parts.len(), 3, "{nick}");
            assert!(MOODS.contains(&parts[0]));
            assert!(THINGS.contains(&parts[1]));
            let n: u32 = parts[2].parse().unwrap();
            assert!((10..100).contains(&n));
        }
    }

    #[test]
    fn same_seed_same_nickname() {
        let a = generate_nickname(&mut StdRng::seed_from_u64(99));
        let b = generate_nickname(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
