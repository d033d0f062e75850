//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations. Every entity kind has its
//! own table whose `parent_id` references the parent kind's table (or
//! `drafts`), so deleting a row removes its whole subtree.

use course_draft::{BackendError, CourseLevel, EntityKind};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    /// Shared connection for repositories
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

/// Open (or create) the database at `db_path` and run migrations.
/// `":memory:"` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> Result<DbState, String> {
    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open db: {}", e))?;

    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| format!("Failed to enable foreign keys: {}", e))?;

    run_migrations(&conn)?;
    log::info!("Database ready at {}", db_path.display());

    Ok(DbState {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Table holding rows of `kind`
pub(crate) fn table_of(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::QuestionCollection => "question_collections",
        EntityKind::Question => "questions",
        EntityKind::AnswerOption => "answer_options",
        EntityKind::Lesson => "lessons",
        EntityKind::VocabSet => "vocab_sets",
        EntityKind::VocabItem => "vocab_items",
    }
}

/// Table the `parent_id` of `kind` points into
pub(crate) fn parent_table_of(kind: EntityKind) -> &'static str {
    kind.parent_kind().map(table_of).unwrap_or("drafts")
}

pub(crate) fn internal(e: impl std::fmt::Display) -> BackendError {
    BackendError::Internal(e.to_string())
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn level_to_sql(level: Option<CourseLevel>) -> Option<String> {
    level
        .and_then(|level| serde_json::to_value(level).ok())
        .and_then(|value| value.as_str().map(str::to_string))
}

pub(crate) fn level_from_sql(raw: Option<String>) -> Option<CourseLevel> {
    raw.and_then(|raw| serde_json::from_value(serde_json::Value::String(raw)).ok())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(names) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    let found = names.flatten().any(|name| name == column);
    found
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS drafts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            subtitle TEXT,
            description TEXT NOT NULL DEFAULT '',
            category TEXT,
            level TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Added after the first schema
    if !column_exists(conn, "drafts", "language") {
        conn.execute("ALTER TABLE drafts ADD COLUMN language TEXT", [])
            .map_err(|e| format!("Failed to add language: {}", e))?;
    }

    // Parents come before children in EntityKind::ALL
    for kind in EntityKind::ALL {
        let table = table_of(kind);
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    parent_id INTEGER NOT NULL REFERENCES {parent}(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL DEFAULT 0,
                    data TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                table = table,
                parent = parent_table_of(kind),
            ),
            [],
        )
        .map_err(|e| format!("Failed to create {}: {}", table, e))?;

        // Create index for faster parent-child queries
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_parent ON {table}(parent_id)", table = table),
            [],
        )
        .map_err(|e| e.to_string())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.db");

        init_db(&path).await.unwrap();
        let state = init_db(&path).await.unwrap();

        let conn = state.connection();
        let conn = conn.lock().await;
        assert!(column_exists(&conn, "drafts", "language"));
        for kind in EntityKind::ALL {
            assert!(column_exists(&conn, table_of(kind), "parent_id"));
        }
    }

    #[test]
    fn test_level_column() {
        assert_eq!(level_to_sql(Some(CourseLevel::Advanced)).as_deref(), Some("advanced"));
        assert_eq!(level_from_sql(Some("beginner".to_string())), Some(CourseLevel::Beginner));
        assert_eq!(level_from_sql(Some("expert".to_string())), None);
        assert_eq!(level_to_sql(None), None);
    }
}
