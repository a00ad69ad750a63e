use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use petal_db::models::{NewNote, NoteRow};
use petal_types::api::{CreateNoteRequest, NoteResponse};

use crate::auth::AppState;
use crate::{parse_db_timestamp, run_db};

#[derive(Debug, Deserialize)]
pub struct NoteQuery {
    pub category_id: Option<i64>,
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let rows = run_db(&state, move |db| db.list_notes(query.category_id)).await?;
    let notes: Vec<NoteResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = run_db(&state, move |db| db.get_note(note_id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(to_response(row)))
}

pub async fn create_note(
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Title and category are required
    let title = req.title.trim().to_string();
    let Some(category_id) = req.category_id else {
        return Err(StatusCode::BAD_REQUEST);
    };
    if title.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let note = NewNote {
        title,
        content: req.content,
        cover_url: req.cover_url.filter(|u| !u.trim().is_empty()),
        category_id,
    };

    let row = run_db(&state, move |db| {
        if !db.category_exists(note.category_id)? {
            return Ok(None);
        }
        let id = db.insert_note(&note)?;
        db.get_note(id)
    })
    .await?
    .ok_or_else(|| {
        warn!("Rejected note for unknown category {}", category_id);
        StatusCode::BAD_REQUEST
    })?;

    info!("Note {} created", row.id);
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    if run_db(&state, move |db| db.delete_note(note_id)).await? {
        info!("Note {} deleted", note_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

fn to_response(row: NoteRow) -> NoteResponse {
    NoteResponse {
        created_at: parse_db_timestamp(&row.created_at, row.id),
        id: row.id,
        title: row.title,
        content: row.content,
        cover_url: row.cover_url,
        category_id: row.category_id,
        category_name: row.category_name,
    }
}
