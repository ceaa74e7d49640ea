//! Backoffice translation and ordering service for an art platform.
//!
//! The interesting state lives in three places: the language registry
//! (with its single-default rule), the translation store keyed by
//! `(entity, field, language)`, and the `display_order` columns admins
//! reorder by hand. Everything else is plumbing around them.

pub mod artworks;
pub mod config;
pub mod db;
pub mod display_order;
pub mod entity;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod retry;
pub mod security;
pub mod server;
pub mod translations;
pub mod translator;
