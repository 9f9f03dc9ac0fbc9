//! Event use-case service.
//!
//! # Responsibility
//! - Provide admin entry points for creating and curating event listings.
//! - Derive slugs from titles when the editor leaves the field blank.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::event::{Event, EventStatus};
use crate::model::RecordId;
use crate::repo::event_repo::{EventListQuery, EventRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::derive_slug;
use log::info;

/// Request model for creating an event from an admin form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    /// Explicit slug; derived from `title` when `None` or blank.
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub venue_id: Option<RecordId>,
    pub organizer_id: Option<RecordId>,
    pub starts_at: i64,
    pub ends_at: Option<i64>,
    pub ticket_url: Option<String>,
}

/// Use-case service wrapper for event operations.
pub struct EventService<R: EventRepository> {
    repo: R,
}

impl<R: EventRepository> EventService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a draft event and returns its stable ID.
    ///
    /// Returns `RepoError::SlugConflict` when the slug is already taken; the
    /// advisory probe may have reported `Unknown` for it.
    pub fn create_event(&self, request: &NewEvent) -> RepoResult<RecordId> {
        let slug = derive_slug(request.slug.as_deref(), &request.title, "title")?;
        let mut event = Event::new(request.title.trim(), slug, request.starts_at);
        event.summary = request.summary.clone();
        event.venue_id = request.venue_id;
        event.organizer_id = request.organizer_id;
        event.ends_at = request.ends_at;
        event.ticket_url = request.ticket_url.clone();

        let id = self.repo.create_event(&event)?;
        info!("event=event_create module=service status=ok event_id={id}");
        Ok(id)
    }

    pub fn update_event(&self, event: &Event) -> RepoResult<()> {
        self.repo.update_event(event)
    }

    pub fn get_event(&self, id: RecordId) -> RepoResult<Option<Event>> {
        self.repo.get_event(id, false)
    }

    pub fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        self.repo.get_event_by_slug(slug.trim())
    }

    pub fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        self.repo.list_events(query)
    }

    /// Lists published events starting at or after `now_ms`, soonest first.
    pub fn list_upcoming(&self, now_ms: i64, limit: u32) -> RepoResult<Vec<Event>> {
        self.repo.list_events(&EventListQuery {
            status: Some(EventStatus::Published),
            starts_after: Some(now_ms),
            limit: Some(limit),
            ..EventListQuery::default()
        })
    }

    /// Moves an event to `Published`.
    pub fn publish_event(&self, id: RecordId) -> RepoResult<()> {
        self.set_status(id, EventStatus::Published)
    }

    /// Moves an event to `Cancelled`; it stays listed with a cancelled flag.
    pub fn cancel_event(&self, id: RecordId) -> RepoResult<()> {
        self.set_status(id, EventStatus::Cancelled)
    }

    pub fn soft_delete_event(&self, id: RecordId) -> RepoResult<()> {
        self.repo.soft_delete_event(id)
    }

    fn set_status(&self, id: RecordId, status: EventStatus) -> RepoResult<()> {
        let mut event = self
            .repo
            .get_event(id, false)?
            .ok_or(RepoError::NotFound(id))?;
        if event.status == status {
            return Ok(());
        }
        event.status = status;
        self.repo.update_event(&event)?;
        info!(
            "event=event_status module=service status=ok event_id={} new_status={}",
            id,
            status.as_str()
        );
        Ok(())
    }
}
