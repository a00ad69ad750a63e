use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use petal_types::api::{CategoryResponse, CreateCategoryRequest};

use crate::auth::AppState;
use crate::run_db;

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let rows = run_db(&state, |db| db.list_categories()).await?;
    let categories: Vec<CategoryResponse> = rows
        .into_iter()
        .map(|row| CategoryResponse {
            id: row.id,
            name: row.name,
        })
        .collect();
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let insert_name = name.clone();
    let id = run_db(&state, move |db| db.create_category(&insert_name)).await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse { id, name })))
}
