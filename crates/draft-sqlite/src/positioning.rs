//! Positioning Operations
//!
//! Sibling order within one parent.

use course_draft::{BackendError, BackendResult, EntityKind, OrderEntry, RealId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{internal, now, table_of};

/// Set the position of every listed row in one transaction.
/// Nothing is written if any entry is not a child of `parent_id`.
pub(crate) fn reorder_rows(
    conn: &mut Connection,
    kind: EntityKind,
    parent_id: RealId,
    entries: &[OrderEntry],
) -> BackendResult<()> {
    let table = table_of(kind);
    let tx = conn.transaction().map_err(internal)?;
    let now = now();

    for entry in entries {
        let owner: Option<i64> = tx
            .query_row(
                &format!("SELECT parent_id FROM {} WHERE id = ?1", table),
                params![entry.id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(internal)?;
        if owner != Some(parent_id.0) {
            // tx is rolled back on drop
            return Err(BackendError::InvalidInput(format!(
                "{} {} is not a child of {}",
                kind, entry.id, parent_id
            )));
        }

        tx.execute(
            &format!("UPDATE {} SET position = ?1, updated_at = ?2 WHERE id = ?3", table),
            params![entry.order, now, entry.id.0],
        )
        .map_err(internal)?;
    }

    tx.commit().map_err(internal)?;
    log::debug!("Reordered {} {} under {}", entries.len(), kind, parent_id);
    Ok(())
}

/// Ids of the children of `parent_id`, ordered by position
pub(crate) fn child_ids(conn: &Connection, kind: EntityKind, parent_id: RealId) -> BackendResult<Vec<RealId>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT id FROM {} WHERE parent_id = ?1 ORDER BY position, id",
            table_of(kind)
        ))
        .map_err(internal)?;
    let ids = stmt
        .query_map(params![parent_id.0], |row| row.get::<_, i64>(0))
        .map_err(internal)?;
    let ids = ids
        .map(|id| id.map(RealId).map_err(internal))
        .collect::<BackendResult<Vec<_>>>()?;
    Ok(ids)
}
