//! Error taxonomy for backoffice actions.
//!
//! Expected/business failures are data, not panics: every action returns
//! `Result<T, ActionError>` and the HTTP layer renders the error as a
//! `{success: false, message}` body with an appropriate status code.
//! Only infrastructure setup (config, database open, server bind) uses
//! `anyhow` and is allowed to abort the process.

use thiserror::Error;

/// A failure of a backoffice action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Input failed validation before any row was touched.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Delete blocked because dependent rows still reference the record.
    #[error("{message}")]
    ReferentialConflict { count: i64, message: String },

    /// The action would break a stated invariant (e.g. deleting the
    /// default language).
    #[error("{0}")]
    InvariantViolation(String),

    /// The store rejected a duplicate unique key.
    #[error("A record with this {field} already exists")]
    UniquenessConflict { field: &'static str },

    /// The entity kind is not supported by this operation. This is a
    /// caller bug, not a data error.
    #[error("Entity kind '{0}' is not supported by this operation")]
    UnsupportedEntity(&'static str),

    /// A third-party service was unreachable or returned an error.
    #[error("External service failure: {0}")]
    ExternalService(String),

    /// Unexpected database error. The wrapped detail is logged server-side
    /// but never shown to the caller verbatim.
    #[error("An unexpected database error occurred")]
    Persistence(#[from] rusqlite::Error),
}

/// Convenience alias used throughout the action modules.
pub type ActionResult<T> = Result<T, ActionError>;
