//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical listing record for a cultural event.
//! - Provide lifecycle helpers for publish/cancel and soft-delete semantics.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `slug` is canonical (see `model::slug`) and unique across events.
//! - `ends_at` must not be earlier than `starts_at` when set.

use crate::model::validation::{
    optional_text, optional_url, require_slug, require_text, ValidationError, MAX_NAME_CHARS,
    MAX_TEXT_CHARS,
};
use crate::model::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of an event listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Visible only in admin dashboards.
    Draft,
    /// Listed on the public site.
    Published,
    /// Still listed, flagged as cancelled.
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Canonical event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub venue_id: Option<RecordId>,
    pub organizer_id: Option<RecordId>,
    /// Unix epoch milliseconds.
    pub starts_at: i64,
    /// Unix epoch milliseconds. Should be >= `starts_at` when set.
    pub ends_at: Option<i64>,
    pub ticket_url: Option<String>,
    pub status: EventStatus,
    /// Soft delete tombstone; the slug stays reserved while tombstoned.
    pub is_deleted: bool,
}

impl Event {
    /// Creates a draft event with a generated stable ID.
    pub fn new(title: impl Into<String>, slug: impl Into<String>, starts_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, slug, starts_at)
    }

    /// Creates a draft event with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: RecordId,
        title: impl Into<String>,
        slug: impl Into<String>,
        starts_at: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            slug: slug.into(),
            summary: None,
            venue_id: None,
            organizer_id: None,
            starts_at,
            ends_at: None,
            ticket_url: None,
            status: EventStatus::Draft,
            is_deleted: false,
        }
    }

    /// Validates field formats and the time range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_NAME_CHARS)?;
        require_slug(&self.slug)?;
        optional_text("summary", self.summary.as_deref(), MAX_TEXT_CHARS)?;
        optional_url("ticket_url", self.ticket_url.as_deref())?;

        if let Some(end) = self.ends_at {
            if end < self.starts_at {
                return Err(ValidationError::InvalidTimeRange {
                    start: self.starts_at,
                    end,
                });
            }
        }

        Ok(())
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Returns whether this event should appear on the public site.
    pub fn is_listed(&self) -> bool {
        !self.is_deleted && self.status != EventStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventStatus};
    use crate::model::validation::ValidationError;

    #[test]
    fn new_event_starts_as_listed_only_after_publish() {
        let mut event = Event::new("Show de Rock", "show-de-rock", 1_000);
        assert_eq!(event.status, EventStatus::Draft);
        assert!(!event.is_listed());

        event.status = EventStatus::Published;
        assert!(event.is_listed());

        event.soft_delete();
        assert!(!event.is_listed());
    }

    #[test]
    fn validate_rejects_inverted_time_range() {
        let mut event = Event::new("Show", "show", 2_000);
        event.ends_at = Some(1_000);
        assert_eq!(
            event.validate(),
            Err(ValidationError::InvalidTimeRange {
                start: 2_000,
                end: 1_000
            })
        );
    }

    #[test]
    fn validate_rejects_non_canonical_slug() {
        let event = Event::new("Show", "Show de Rock", 0);
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidSlug(_))
        ));
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Cancelled,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("archived"), None);
    }
}
