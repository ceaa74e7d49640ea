//! Entity translation orchestrator.
//!
//! Bridges an entity's default-language field values and the translation
//! store. The default-language rows are written first; every other
//! language then gets a machine-translated row, best-effort. A failed
//! translation never rolls back or blocks the others and never fails the
//! call — each language/field pair reports its own outcome, so an admin
//! view can show translation completeness instead of guessing from logs.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::db::Database;
use crate::entity::EntityKind;
use crate::error::{ActionError, ActionResult};
use crate::language::{default_language, list_languages};
use crate::translations::upsert_translation;
use crate::translator::Translator;

/// Outcome of one language/field pair in the fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FanoutStatus {
    Translated,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FanoutOutcome {
    pub language_code: String,
    pub field: String,
    #[serde(flatten)]
    pub status: FanoutStatus,
}

/// Structured result of a translation fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutReport {
    /// True when no default language exists and nothing was written.
    pub skipped_no_default: bool,
    /// Code of the language the values were authored in.
    pub source_language: Option<String>,
    /// Number of default-language rows upserted.
    pub default_upserts: usize,
    /// One entry per non-default language per field.
    pub outcomes: Vec<FanoutOutcome>,
}

impl FanoutReport {
    fn skipped() -> Self {
        Self {
            skipped_no_default: true,
            source_language: None,
            default_upserts: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FanoutStatus::Failed { .. }))
            .count()
    }

    /// Every configured language has every field, including the source.
    pub fn is_complete(&self) -> bool {
        !self.skipped_no_default && self.failed_count() == 0
    }
}

/// Upsert the default-language rows for `fields` and fan translations out
/// to every other configured language.
///
/// Field names are checked against the entity kind before anything is
/// written. A missing default language downgrades the whole call to a
/// logged no-op. Store errors propagate; translation API errors do not.
pub async fn handle_entity_translations(
    db: &Database,
    translator: &Translator,
    kind: EntityKind,
    entity_id: i64,
    fields: &BTreeMap<String, String>,
) -> ActionResult<FanoutReport> {
    for field in fields.keys() {
        if !kind.allows_field(field) {
            return Err(ActionError::Validation(format!(
                "Field '{}' is not translatable on {}",
                field, kind
            )));
        }
    }

    let Some(default) = default_language(db)? else {
        warn!(
            "No default language configured; skipping translations for {} {}",
            kind, entity_id
        );
        return Ok(FanoutReport::skipped());
    };

    for (field, value) in fields {
        upsert_translation(db, kind, entity_id, field, default.id, value)?;
    }

    let targets: Vec<_> = list_languages(db)?
        .into_iter()
        .filter(|lang| lang.id != default.id)
        .collect();

    // One independent request per language/field pair; failures are
    // collected, not propagated.
    let pairs: Vec<(&crate::language::LanguageRecord, &String, &String)> = targets
        .iter()
        .flat_map(|lang| fields.iter().map(move |(field, value)| (lang, field, value)))
        .collect();

    let translated = futures::future::join_all(pairs.iter().map(|(lang, _, value)| {
        translator.translate(value, &default.code, &lang.code)
    }))
    .await;

    let mut outcomes = Vec::with_capacity(pairs.len());
    for ((lang, field, _), result) in pairs.iter().zip(translated) {
        let status = match result {
            Ok(value) => {
                upsert_translation(db, kind, entity_id, field, lang.id, &value)?;
                FanoutStatus::Translated
            }
            Err(e) => {
                warn!(
                    "Translation fan-out failed for {} {} field '{}' -> {}: {}",
                    kind, entity_id, field, lang.code, e
                );
                FanoutStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(FanoutOutcome {
            language_code: lang.code.clone(),
            field: (*field).clone(),
            status,
        });
    }

    let report = FanoutReport {
        skipped_no_default: false,
        source_language: Some(default.code),
        default_upserts: fields.len(),
        outcomes,
    };
    info!(
        "Translations for {} {}: {} source field(s), {} fan-out failure(s)",
        kind,
        entity_id,
        report.default_upserts,
        report.failed_count()
    );
    Ok(report)
}
