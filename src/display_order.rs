//! Display order sequencer: atomic bulk renumbering of admin-sorted lists.
//!
//! `display_order` is a pure UI sort key, independent of primary key and
//! creation order. Admin reorder screens submit the whole new numbering in
//! one batch; it is applied all-or-nothing so a half-applied reorder can
//! never be observed.

use std::collections::HashSet;

use rusqlite::params;
use serde::Deserialize;

use crate::db::Database;
use crate::entity::EntityKind;
use crate::error::{ActionError, ActionResult};

/// One row's new position in a reorder batch.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DisplayOrderUpdate {
    pub id: i64,
    pub display_order: i64,
}

/// Apply a reorder batch as one transaction.
///
/// The kind must be one the sequencer supports (it must map to a table
/// with a `display_order` column); anything else is a caller bug reported
/// as `UnsupportedEntity`. The batch itself must be internally consistent:
/// no id appears twice and no two items are assigned the same position.
/// An update touching zero rows (unknown id) aborts and rolls back the
/// entire batch.
pub fn update_display_order(
    db: &Database,
    kind: EntityKind,
    updates: &[DisplayOrderUpdate],
) -> ActionResult<()> {
    let table = kind
        .display_order_table()
        .ok_or_else(|| ActionError::UnsupportedEntity(kind.as_str()))?;

    let mut seen_ids = HashSet::new();
    let mut seen_orders = HashSet::new();
    for update in updates {
        if !seen_ids.insert(update.id) {
            return Err(ActionError::Validation(format!(
                "Duplicate id {} in reorder batch",
                update.id
            )));
        }
        if !seen_orders.insert(update.display_order) {
            return Err(ActionError::Validation(format!(
                "Duplicate display order {} in reorder batch",
                update.display_order
            )));
        }
    }

    db.with_tx(|conn| {
        let sql = format!("UPDATE {} SET display_order = ?1 WHERE id = ?2", table);
        let mut stmt = conn.prepare(&sql)?;

        for update in updates {
            let affected = stmt.execute(params![update.display_order, update.id])?;
            if affected == 0 {
                return Err(ActionError::NotFound(format!(
                    "{} {} not found; reorder aborted",
                    kind, update.id
                )));
            }
        }
        Ok(())
    })
}

/// Highest `display_order` among one artist's presale artworks, 0 when the
/// artist has none. New items are appended at this value plus one.
pub fn get_max_display_order_by_artist(db: &Database, artist_id: i64) -> ActionResult<i64> {
    let max: i64 = db.conn().query_row(
        "SELECT COALESCE(MAX(display_order), 0) FROM presale_artworks WHERE artist_id = ?1",
        params![artist_id],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Recompute a dense 1..N ordering over one artist's full item set,
/// ordered by current position (unpositioned rows last) with id as the
/// tie-break. Applied transactionally.
pub fn reset_display_order_for_artist(db: &Database, artist_id: i64) -> ActionResult<usize> {
    db.with_tx(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id FROM presale_artworks
             WHERE artist_id = ?1
             ORDER BY display_order IS NULL, display_order ASC, id ASC",
        )?;
        let ids = stmt
            .query_map(params![artist_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        let mut update =
            conn.prepare("UPDATE presale_artworks SET display_order = ?1 WHERE id = ?2")?;
        for (position, id) in ids.iter().enumerate() {
            update.execute(params![(position + 1) as i64, id])?;
        }
        Ok(ids.len())
    })
}
