//! Translation store: one row per `(entity, field, language)` value.
//!
//! Rows are keyed by the `(entity_type, entity_id, field, language_id)`
//! tuple. The upsert targets that tuple directly, and the schema carries a
//! matching UNIQUE index, so duplicates cannot appear even for writers that
//! bypass this module.

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

use crate::db::Database;
use crate::entity::EntityKind;
use crate::error::ActionResult;

#[derive(Debug, Clone, Serialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub entity_type: EntityKind,
    pub entity_id: i64,
    pub field: String,
    pub language_id: i64,
    pub value: String,
    pub updated_at: String,
}

/// Insert or overwrite the value for one `(entity, field, language)` tuple.
/// Calling twice with the same value leaves a single unchanged row.
pub fn upsert_translation(
    db: &Database,
    kind: EntityKind,
    entity_id: i64,
    field: &str,
    language_id: i64,
    value: &str,
) -> ActionResult<()> {
    let updated_at = Utc::now().to_rfc3339();
    db.conn().execute(
        "INSERT INTO translations (entity_type, entity_id, field, language_id, value, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(entity_type, entity_id, field, language_id)
         DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![kind.as_str(), entity_id, field, language_id, value, updated_at],
    )?;
    Ok(())
}

/// All rows for one entity, across every field and language. Used to
/// hydrate edit forms.
pub fn get_translations_for_entity(
    db: &Database,
    kind: EntityKind,
    entity_id: i64,
) -> ActionResult<Vec<TranslationRecord>> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, entity_id, field, language_id, value, updated_at
         FROM translations
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY field ASC, language_id ASC",
    )?;

    let records = stmt
        .query_map(params![kind.as_str(), entity_id], |row| {
            Ok(TranslationRecord {
                id: row.get(0)?,
                entity_type: kind,
                entity_id: row.get(1)?,
                field: row.get(2)?,
                language_id: row.get(3)?,
                value: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Remove every row owned by one entity. Returns the number removed.
/// Entity delete actions call this so no orphaned rows are left behind.
pub fn delete_translations_for_entity(
    db: &Database,
    kind: EntityKind,
    entity_id: i64,
) -> ActionResult<usize> {
    let deleted = db.conn().execute(
        "DELETE FROM translations WHERE entity_type = ?1 AND entity_id = ?2",
        params![kind.as_str(), entity_id],
    )?;
    Ok(deleted)
}

/// How many rows reference a language. `delete_language` blocks while this
/// is non-zero.
pub fn count_for_language(db: &Database, language_id: i64) -> ActionResult<i64> {
    Ok(count_for_language_with_conn(&db.conn(), language_id)?)
}

/// Same as [`count_for_language`], for callers already inside a transaction.
pub(crate) fn count_for_language_with_conn(
    conn: &rusqlite::Connection,
    language_id: i64,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM translations WHERE language_id = ?1",
        params![language_id],
        |row| row.get(0),
    )
}
