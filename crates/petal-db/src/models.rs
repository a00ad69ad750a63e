/// Database row types: these map directly to SQLite rows.
/// Distinct from petal-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub created_at: String,
}

/// Fields supplied by the admin when creating a note.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub content: String,
    pub nickname: String,
    pub created_at: String,
}
