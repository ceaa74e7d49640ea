//! Presale artworks: the one entity whose list screens are hand-ordered.
//!
//! New artworks are appended at the end of their artist's ordering, and a
//! delete removes the artwork's translation rows in the same transaction
//! so nothing is orphaned.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::Database;
use crate::entity::EntityKind;
use crate::error::{ActionError, ActionResult};

#[derive(Debug, Clone, Serialize)]
pub struct PresaleArtwork {
    pub id: i64,
    pub artist_id: i64,
    pub title: String,
    pub display_order: Option<i64>,
    pub created_at: String,
}

fn row_to_artwork(row: &rusqlite::Row<'_>) -> rusqlite::Result<PresaleArtwork> {
    Ok(PresaleArtwork {
        id: row.get(0)?,
        artist_id: row.get(1)?,
        title: row.get(2)?,
        display_order: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Create an artwork at the end of the artist's current ordering.
pub fn create_presale_artwork(
    db: &Database,
    artist_id: i64,
    title: &str,
) -> ActionResult<PresaleArtwork> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ActionError::Validation("Artwork title is required".to_string()));
    }

    let created_at = Utc::now().to_rfc3339();
    db.with_tx(|conn| {
        // Append after the artist's current maximum, inside the same
        // transaction as the insert so two creates cannot share a slot.
        let max: i64 = conn.query_row(
            "SELECT COALESCE(MAX(display_order), 0) FROM presale_artworks WHERE artist_id = ?1",
            params![artist_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO presale_artworks (artist_id, title, display_order, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![artist_id, title, max + 1, created_at],
        )?;

        Ok(PresaleArtwork {
            id: conn.last_insert_rowid(),
            artist_id,
            title: title.to_string(),
            display_order: Some(max + 1),
            created_at: created_at.clone(),
        })
    })
}

/// Delete an artwork together with its translation rows.
pub fn delete_presale_artwork(db: &Database, id: i64) -> ActionResult<()> {
    db.with_tx(|conn| {
        let deleted = conn.execute("DELETE FROM presale_artworks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(ActionError::NotFound(format!("Artwork {} not found", id)));
        }

        conn.execute(
            "DELETE FROM translations WHERE entity_type = ?1 AND entity_id = ?2",
            params![EntityKind::PresaleArtwork.as_str(), id],
        )?;
        Ok(())
    })
}

pub fn get_presale_artwork(db: &Database, id: i64) -> ActionResult<Option<PresaleArtwork>> {
    let record = db
        .conn()
        .query_row(
            "SELECT id, artist_id, title, display_order, created_at
             FROM presale_artworks WHERE id = ?1",
            params![id],
            row_to_artwork,
        )
        .optional()?;
    Ok(record)
}

/// One artist's artworks in display order, unpositioned rows last.
pub fn list_presale_artworks_by_artist(
    db: &Database,
    artist_id: i64,
) -> ActionResult<Vec<PresaleArtwork>> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, artist_id, title, display_order, created_at
         FROM presale_artworks
         WHERE artist_id = ?1
         ORDER BY display_order IS NULL, display_order ASC, id ASC",
    )?;
    let artworks = stmt
        .query_map(params![artist_id], row_to_artwork)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(artworks)
}
