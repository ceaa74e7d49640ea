//! Closed set of entity kinds that own translatable content.
//!
//! The translation table stores its owner as a string discriminator with no
//! foreign key, so a typo in the discriminator would silently orphan rows.
//! `EntityKind` closes that hole: every kind the backoffice knows about is
//! listed here together with the field names it is allowed to translate,
//! and all store/orchestrator entry points take the enum, not a string.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// An entity kind with translatable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityKind {
    ArtworkStyle,
    DetailedFaqHeader,
    Faq,
    TeamMember,
    BlogCategory,
    Artist,
    PresaleArtwork,
}

impl EntityKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::ArtworkStyle,
        EntityKind::DetailedFaqHeader,
        EntityKind::Faq,
        EntityKind::TeamMember,
        EntityKind::BlogCategory,
        EntityKind::Artist,
        EntityKind::PresaleArtwork,
    ];

    /// Discriminator string stored in the `translations.entity_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ArtworkStyle => "ArtworkStyle",
            EntityKind::DetailedFaqHeader => "DetailedFaqHeader",
            EntityKind::Faq => "Faq",
            EntityKind::TeamMember => "TeamMember",
            EntityKind::BlogCategory => "BlogCategory",
            EntityKind::Artist => "Artist",
            EntityKind::PresaleArtwork => "PresaleArtwork",
        }
    }

    /// Field names this kind is allowed to translate.
    pub fn allowed_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::ArtworkStyle => &["name", "description"],
            EntityKind::DetailedFaqHeader => &["title", "subtitle"],
            EntityKind::Faq => &["question", "answer"],
            EntityKind::TeamMember => &["role", "bio"],
            EntityKind::BlogCategory => &["name"],
            EntityKind::Artist => &["bio", "statement"],
            EntityKind::PresaleArtwork => &["title", "description"],
        }
    }

    /// Whether `field` is a translatable attribute of this kind.
    pub fn allows_field(&self, field: &str) -> bool {
        self.allowed_fields().contains(&field)
    }

    /// Table backing this kind's `display_order` column, if it has one.
    /// The Display Order Sequencer is gated on this.
    pub fn display_order_table(&self) -> Option<&'static str> {
        match self {
            EntityKind::PresaleArtwork => Some("presale_artworks"),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a discriminator string back into a kind.
impl std::str::FromStr for EntityKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ActionError::Validation(format!("Unknown entity type '{}'", s)))
    }
}

impl TryFrom<String> for EntityKind {
    type Error = ActionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> String {
        kind.as_str().to_string()
    }
}
