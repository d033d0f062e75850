//! Draft Repository - Core Operations
//!
//! SQLite-backed `DraftBackend`. Specialized operations are in separate
//! modules:
//! - positioning: batched sibling reorders
//! - snapshot: loading a whole draft

use async_trait::async_trait;
use course_draft::{
    BackendError, BackendResult, DraftBackend, DraftDetails, DraftSnapshot, EntityKind,
    OrderEntry, Record, RealId,
};
use rusqlite::{params, Connection};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{internal, level_to_sql, now, parent_table_of, table_of};
use crate::{positioning, snapshot};

/// SQLite implementation of the draft backend
pub struct SqliteDraftRepository {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteDraftRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Register a new, empty draft
    pub async fn create_draft(&self, details: &DraftDetails) -> BackendResult<RealId> {
        let conn = self.conn.lock().await;
        let now = now();
        conn.execute(
            "INSERT INTO drafts (title, subtitle, description, category, level, language, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                details.title,
                details.subtitle,
                details.description,
                details.category,
                level_to_sql(details.level),
                details.language,
                now
            ],
        )
        .map_err(internal)?;
        let id = RealId(conn.last_insert_rowid());
        log::info!("Created draft {}", id);
        Ok(id)
    }

    /// Every draft with its title, newest first
    pub async fn list_drafts(&self) -> BackendResult<Vec<(RealId, String)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, title FROM drafts ORDER BY updated_at DESC, id DESC")
            .map_err(internal)?;
        let rows = stmt
            .query_map([], |row| Ok((RealId(row.get(0)?), row.get::<_, String>(1)?)))
            .map_err(internal)?;
        let drafts = rows.collect::<Result<Vec<_>, _>>().map_err(internal)?;
        Ok(drafts)
    }

    /// Remove a draft and everything under it
    pub async fn delete_draft(&self, draft_id: RealId) -> BackendResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute("DELETE FROM drafts WHERE id = ?1", params![draft_id.0])
            .map_err(internal)?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("draft {}", draft_id)));
        }
        Ok(())
    }

    /// Ids of the stored children of `parent_id`, by position
    pub async fn children(&self, kind: EntityKind, parent_id: RealId) -> BackendResult<Vec<RealId>> {
        let conn = self.conn.lock().await;
        positioning::child_ids(&conn, kind, parent_id)
    }
}

fn parent_exists(conn: &Connection, kind: EntityKind, parent_id: RealId) -> BackendResult<bool> {
    let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", parent_table_of(kind));
    conn.query_row(&query, params![parent_id.0], |row| row.get::<_, bool>(0))
        .map_err(internal)
}

fn encode(kind: EntityKind, record: &Record) -> BackendResult<String> {
    if record.payload.kind() != kind {
        return Err(BackendError::InvalidInput(format!(
            "{} payload sent as {}",
            record.payload.kind(),
            kind
        )));
    }
    serde_json::to_string(&record.payload).map_err(|e| BackendError::InvalidInput(e.to_string()))
}

#[async_trait]
impl DraftBackend for SqliteDraftRepository {
    async fn create(&self, kind: EntityKind, parent_id: RealId, record: &Record) -> BackendResult<RealId> {
        let data = encode(kind, record)?;
        let conn = self.conn.lock().await;

        if !parent_exists(&conn, kind, parent_id)? {
            return Err(BackendError::NotFound(format!("parent {} of {}", parent_id, kind)));
        }

        conn.execute(
            &format!(
                "INSERT INTO {} (parent_id, position, data, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                table_of(kind)
            ),
            params![parent_id.0, record.order, data, now()],
        )
        .map_err(internal)?;

        let id = RealId(conn.last_insert_rowid());
        log::debug!("Created {} {} under {}", kind, id, parent_id);
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, id: RealId, record: &Record) -> BackendResult<RealId> {
        let data = encode(kind, record)?;
        let conn = self.conn.lock().await;

        let changed = conn
            .execute(
                &format!(
                    "UPDATE {} SET position = ?1, data = ?2, updated_at = ?3 WHERE id = ?4",
                    table_of(kind)
                ),
                params![record.order, data, now(), id.0],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("{} {}", kind, id)));
        }
        Ok(id)
    }

    async fn delete(&self, kind: EntityKind, id: RealId) -> BackendResult<()> {
        let conn = self.conn.lock().await;

        // Descendants go with it through ON DELETE CASCADE
        let changed = conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table_of(kind)), params![id.0])
            .map_err(internal)?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("{} {}", kind, id)));
        }
        log::debug!("Deleted {} {}", kind, id);
        Ok(())
    }

    async fn reorder(&self, kind: EntityKind, parent_id: RealId, entries: &[OrderEntry]) -> BackendResult<()> {
        let mut conn = self.conn.lock().await;
        positioning::reorder_rows(&mut conn, kind, parent_id, entries)
    }

    async fn update_details(&self, draft_id: RealId, details: &DraftDetails) -> BackendResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE drafts SET title = ?1, subtitle = ?2, description = ?3, category = ?4,
                 level = ?5, language = ?6, updated_at = ?7 WHERE id = ?8",
                params![
                    details.title,
                    details.subtitle,
                    details.description,
                    details.category,
                    level_to_sql(details.level),
                    details.language,
                    now(),
                    draft_id.0
                ],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(BackendError::NotFound(format!("draft {}", draft_id)));
        }
        Ok(())
    }

    async fn load_draft(&self, draft_id: RealId) -> BackendResult<DraftSnapshot> {
        let conn = self.conn.lock().await;
        snapshot::load_snapshot(&conn, draft_id)
    }
}
