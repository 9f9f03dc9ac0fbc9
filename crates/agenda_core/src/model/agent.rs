//! Agent (artist/organizer) domain model.
//!
//! Artists and organizers share one profile shape; `kind` tells them apart
//! and scopes slug uniqueness.
//!
//! # Invariants
//! - `(kind, slug)` is unique.
//! - `instagram` is stored normalized (no `@`, lowercase).

use crate::model::slug::normalize_handle;
use crate::model::validation::{
    optional_handle, optional_text, require_slug, require_text, ValidationError, MAX_NAME_CHARS,
    MAX_TEXT_CHARS,
};
use crate::model::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an agent profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Artist,
    Organizer,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Organizer => "organizer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "artist" => Some(Self::Artist),
            "organizer" => Some(Self::Organizer),
            _ => None,
        }
    }
}

/// Canonical artist/organizer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: RecordId,
    pub kind: AgentKind,
    pub name: String,
    pub slug: String,
    pub instagram: Option<String>,
    pub bio: Option<String>,
    pub city_id: Option<RecordId>,
    pub is_deleted: bool,
}

impl Agent {
    pub fn new(kind: AgentKind, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            slug: slug.into(),
            instagram: None,
            bio: None,
            city_id: None,
            is_deleted: false,
        }
    }

    /// Sets the Instagram handle from raw user input (`@Handle` accepted).
    pub fn set_instagram(&mut self, raw: &str) {
        self.instagram = normalize_handle(raw);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        require_slug(&self.slug)?;
        optional_handle(self.instagram.as_deref())?;
        optional_text("bio", self.bio.as_deref(), MAX_TEXT_CHARS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Agent, AgentKind};
    use crate::model::validation::ValidationError;

    #[test]
    fn set_instagram_normalizes_raw_input() {
        let mut agent = Agent::new(AgentKind::Artist, "Banda Mar", "banda-mar");
        agent.set_instagram(" @BandaMar ");
        assert_eq!(agent.instagram.as_deref(), Some("bandamar"));
        assert!(agent.validate().is_ok());

        agent.set_instagram("   ");
        assert_eq!(agent.instagram, None);
    }

    #[test]
    fn validate_rejects_handle_with_spaces() {
        let mut agent = Agent::new(AgentKind::Organizer, "Coletivo", "coletivo");
        agent.instagram = Some("coletivo sonoro".to_string());
        assert!(matches!(
            agent.validate(),
            Err(ValidationError::InvalidHandle(_))
        ));
    }
}
