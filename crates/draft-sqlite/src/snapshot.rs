//! Snapshot Loading
//!
//! Lists everything stored for one draft.

use course_draft::{BackendError, BackendResult, DraftDetails, DraftSnapshot, EntityKind, Payload, RealId, SnapshotRow};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{internal, level_from_sql, table_of};

/// WHERE clause selecting rows of `kind` that belong to draft `?1`
fn scope(kind: EntityKind) -> String {
    match kind.parent_kind() {
        None => "parent_id = ?1".to_string(),
        Some(parent) => format!(
            "parent_id IN (SELECT id FROM {} WHERE {})",
            table_of(parent),
            scope(parent)
        ),
    }
}

fn load_details(conn: &Connection, draft_id: RealId) -> BackendResult<DraftDetails> {
    let row = conn
        .query_row(
            "SELECT title, subtitle, description, category, level, language FROM drafts WHERE id = ?1",
            params![draft_id.0],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()
        .map_err(internal)?;

    let (title, subtitle, description, category, level, language) =
        row.ok_or_else(|| BackendError::NotFound(format!("draft {}", draft_id)))?;
    Ok(DraftDetails {
        title,
        subtitle,
        description,
        category,
        level: level_from_sql(level),
        language,
    })
}

pub(crate) fn load_snapshot(conn: &Connection, draft_id: RealId) -> BackendResult<DraftSnapshot> {
    let details = load_details(conn, draft_id)?;

    let mut rows = Vec::new();
    for kind in EntityKind::ALL {
        let query = format!(
            "SELECT id, parent_id, position, data FROM {} WHERE {} ORDER BY parent_id, position, id",
            table_of(kind),
            scope(kind)
        );
        let mut stmt = conn.prepare(&query).map_err(internal)?;
        let mapped = stmt
            .query_map(params![draft_id.0], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(internal)?;

        for row in mapped {
            let (id, parent_id, position, data) = row.map_err(internal)?;
            let payload: Payload = serde_json::from_str(&data)
                .map_err(|e| internal(format!("{} {}: {}", kind, id, e)))?;
            if payload.kind() != kind {
                return Err(internal(format!("{} {} holds a {} payload", kind, id, payload.kind())));
            }
            rows.push(SnapshotRow {
                id: RealId(id),
                parent_id: RealId(parent_id),
                order: position,
                payload,
            });
        }
    }

    log::debug!("Loaded {} rows for draft {}", rows.len(), draft_id);
    Ok(DraftSnapshot {
        draft_id,
        details,
        rows,
    })
}
