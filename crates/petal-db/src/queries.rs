use crate::models::{CategoryRow, MessageRow, NewNote, NoteRow};
use crate::Database;
use anyhow::Result;
use petal_types::config::ConfigStore;
use rusqlite::{Connection, Row};

const NOTE_COLUMNS: &str =
    "n.id, n.title, n.content, n.cover_url, n.category_id, c.name, n.created_at";

impl Database {
    // -- Site config --

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM site_config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn upsert_config(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO site_config (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Write several keys at once; either all land or none do.
    pub fn upsert_config_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for (key, value) in entries {
                tx.execute(
                    "INSERT INTO site_config (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    (key, value),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Atomically add one to a numeric config value, creating it at 1.
    /// Returns the new value.
    pub fn increment_config(&self, key: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let value = conn.query_row(
                "INSERT INTO site_config (key, value) VALUES (?1, '1')
                 ON CONFLICT(key) DO UPDATE
                    SET value = CAST(CAST(site_config.value AS INTEGER) + 1 AS TEXT)
                 RETURNING CAST(value AS INTEGER)",
                [key],
                |row| row.get(0),
            )?;
            Ok(value)
        })
    }

    /// Cheapest possible read, used by the keep-alive ping.
    pub fn first_config_key(&self) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT key FROM site_config LIMIT 1", [], |row| row.get(0))
                .optional()
        })
    }

    // -- Categories --

    pub fn create_category(&self, name: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM categories WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Notes --

    pub fn insert_note(&self, note: &NewNote) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (title, content, cover_url, category_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![note.title, note.content, note.cover_url, note.category_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first, optionally restricted to one category.
    pub fn list_notes(&self, category_id: Option<i64>) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| query_notes(conn, category_id))
    }

    pub fn get_note(&self, id: i64) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes n
                 LEFT JOIN categories c ON n.category_id = c.id
                 WHERE n.id = ?1"
            );
            conn.query_row(&sql, [id], note_from_row).optional()
        })
    }

    /// Returns false when no note had that id.
    pub fn delete_note(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, content: &str, nickname: &str) -> Result<MessageRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO messages (content, nickname) VALUES (?1, ?2)
                 RETURNING id, content, nickname, created_at",
                (content, nickname),
                message_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, nickname, created_at
                 FROM messages
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }
}

impl ConfigStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_config(key)
    }

    fn upsert(&self, key: &str, value: &str) -> Result<()> {
        self.upsert_config(key, value)
    }
}

fn query_notes(conn: &Connection, category_id: Option<i64>) -> Result<Vec<NoteRow>> {
    // JOIN categories to fetch the name in the same query
    let sql = format!(
        "SELECT {NOTE_COLUMNS}
         FROM notes n
         LEFT JOIN categories c ON n.category_id = c.id
         WHERE (?1 IS NULL OR n.category_id = ?1)
         ORDER BY n.created_at DESC, n.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([category_id], note_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        cover_url: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        nickname: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
