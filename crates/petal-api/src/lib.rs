pub mod auth;
pub mod categories;
pub mod images;
pub mod messages;
pub mod middleware;
pub mod notes;
pub mod routes;
pub mod site;

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};

use petal_db::Database;

use crate::auth::AppState;

pub use routes::router;

/// Run a blocking DB closure off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub(crate) fn parse_db_timestamp(raw: &str, row_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row {}: {}", raw, row_id, e);
            DateTime::default()
        })
}
