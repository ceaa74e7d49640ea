//! Language registry: CRUD for content languages with a single-default rule.
//!
//! At most one language carries the `is_default` flag, and once a default
//! has been chosen there is always exactly one. The clear-old-flag /
//! set-new-flag pair runs inside one transaction so a concurrent reader can
//! never observe zero defaults mid-handover.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{ActionError, ActionResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRecord {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_default: bool,
}

/// Incoming payload for create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInput {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Normalize and validate a payload. Names are trimmed; codes are trimmed
/// and lowercased, 2 to 5 characters of ASCII letters, digits or `-`.
fn validate(input: &LanguageInput) -> ActionResult<(String, String)> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ActionError::Validation("Language name is required".to_string()));
    }

    let code = input.code.trim().to_lowercase();
    if code.len() < 2 || code.len() > 5 {
        return Err(ActionError::Validation(
            "Language code must be 2 to 5 characters".to_string(),
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ActionError::Validation(
            "Language code may only contain letters, digits and '-'".to_string(),
        ));
    }

    Ok((name, code))
}

/// Translate a UNIQUE-index rejection into a field-specific conflict.
fn map_unique_violation(e: rusqlite::Error) -> ActionError {
    if let rusqlite::Error::SqliteFailure(err, Some(msg)) = &e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("languages.code") {
                return ActionError::UniquenessConflict { field: "code" };
            }
            if msg.contains("languages.name") {
                return ActionError::UniquenessConflict { field: "name" };
            }
        }
    }
    ActionError::Persistence(e)
}

fn row_to_language(row: &rusqlite::Row<'_>) -> rusqlite::Result<LanguageRecord> {
    Ok(LanguageRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        is_default: row.get::<_, i64>(3)? != 0,
    })
}

fn get_language_with_conn(conn: &Connection, id: i64) -> ActionResult<Option<LanguageRecord>> {
    let record = conn
        .query_row(
            "SELECT id, name, code, is_default FROM languages WHERE id = ?1",
            params![id],
            row_to_language,
        )
        .optional()?;
    Ok(record)
}

/// Create a language. When the new language is marked default, the flag is
/// cleared on every other row first, in the same transaction.
pub fn create_language(db: &Database, input: &LanguageInput) -> ActionResult<LanguageRecord> {
    let (name, code) = validate(input)?;

    db.with_tx(|conn| {
        if input.is_default {
            conn.execute("UPDATE languages SET is_default = 0 WHERE is_default = 1", [])?;
        }

        conn.execute(
            "INSERT INTO languages (name, code, is_default) VALUES (?1, ?2, ?3)",
            params![name, code, input.is_default as i64],
        )
        .map_err(map_unique_violation)?;

        Ok(LanguageRecord {
            id: conn.last_insert_rowid(),
            name: name.clone(),
            code: code.clone(),
            is_default: input.is_default,
        })
    })
}

/// Update a language, applying the same default-clearing rule atomically
/// with the row update itself.
pub fn update_language(db: &Database, id: i64, input: &LanguageInput) -> ActionResult<LanguageRecord> {
    let (name, code) = validate(input)?;

    db.with_tx(|conn| {
        let existing = get_language_with_conn(conn, id)?
            .ok_or_else(|| ActionError::NotFound(format!("Language {} not found", id)))?;

        // The default can only move, never vanish: demote by promoting
        // another language instead.
        if existing.is_default && !input.is_default {
            return Err(ActionError::InvariantViolation(
                "Cannot unset the default language; mark another language as default instead"
                    .to_string(),
            ));
        }

        if input.is_default {
            conn.execute(
                "UPDATE languages SET is_default = 0 WHERE is_default = 1 AND id != ?1",
                params![id],
            )?;
        }

        conn.execute(
            "UPDATE languages SET name = ?1, code = ?2, is_default = ?3 WHERE id = ?4",
            params![name, code, input.is_default as i64, id],
        )
        .map_err(map_unique_violation)?;

        Ok(LanguageRecord {
            id,
            name: name.clone(),
            code: code.clone(),
            is_default: input.is_default,
        })
    })
}

/// Delete a language. Blocked while any translation references it, and
/// blocked outright for the current default.
pub fn delete_language(db: &Database, id: i64) -> ActionResult<()> {
    db.with_tx(|conn| {
        let record = get_language_with_conn(conn, id)?
            .ok_or_else(|| ActionError::NotFound(format!("Language {} not found", id)))?;

        let count = crate::translations::count_for_language_with_conn(conn, id)?;
        if count > 0 {
            return Err(ActionError::ReferentialConflict {
                count,
                message: format!(
                    "Language '{}' is still referenced by {} translation(s)",
                    record.name, count
                ),
            });
        }

        if record.is_default {
            return Err(ActionError::InvariantViolation(format!(
                "Language '{}' is the default language and cannot be deleted",
                record.name
            )));
        }

        conn.execute("DELETE FROM languages WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// All languages, ordered by name ascending (the list-screen default).
pub fn list_languages(db: &Database) -> ActionResult<Vec<LanguageRecord>> {
    let conn = db.conn();
    let mut stmt =
        conn.prepare("SELECT id, name, code, is_default FROM languages ORDER BY name ASC")?;
    let languages = stmt
        .query_map([], row_to_language)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(languages)
}

pub fn get_language(db: &Database, id: i64) -> ActionResult<Option<LanguageRecord>> {
    get_language_with_conn(&db.conn(), id)
}

/// The current default language, if one has been designated.
pub fn default_language(db: &Database) -> ActionResult<Option<LanguageRecord>> {
    let record = db
        .conn()
        .query_row(
            "SELECT id, name, code, is_default FROM languages WHERE is_default = 1",
            [],
            row_to_language,
        )
        .optional()?;
    Ok(record)
}
