//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `events` table.
//! - Translate slug collisions into `RepoError::SlugConflict`.
//!
//! # Invariants
//! - Write paths call `Event::validate()` before SQL mutations.
//! - Listing is ordered by `starts_at`, then `id`, for stable pagination.

use crate::model::event::{Event, EventStatus};
use crate::model::RecordId;
use crate::repo::{
    bool_to_int, map_slug_write_error, parse_bool, parse_optional_record_id, parse_record_id,
    push_pagination, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    slug,
    summary,
    venue_id,
    organizer_id,
    starts_at,
    ends_at,
    ticket_url,
    status,
    is_deleted
FROM events";

const COLLECTION: &str = "events";

/// Query options for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    pub status: Option<EventStatus>,
    pub venue_id: Option<RecordId>,
    pub organizer_id: Option<RecordId>,
    /// Only events starting at or after this epoch-ms instant.
    pub starts_after: Option<i64>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for event CRUD operations.
pub trait EventRepository {
    fn create_event(&self, event: &Event) -> RepoResult<RecordId>;
    fn update_event(&self, event: &Event) -> RepoResult<()>;
    fn get_event(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Event>>;
    fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>>;
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>>;
    fn soft_delete_event(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<RecordId> {
        event.validate()?;

        self.conn
            .execute(
                "INSERT INTO events (
                    id,
                    title,
                    slug,
                    summary,
                    venue_id,
                    organizer_id,
                    starts_at,
                    ends_at,
                    ticket_url,
                    status,
                    is_deleted
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                params![
                    event.id.to_string(),
                    event.title.as_str(),
                    event.slug.as_str(),
                    event.summary.as_deref(),
                    event.venue_id.map(|id| id.to_string()),
                    event.organizer_id.map(|id| id.to_string()),
                    event.starts_at,
                    event.ends_at,
                    event.ticket_url.as_deref(),
                    event.status.as_str(),
                    bool_to_int(event.is_deleted),
                ],
            )
            .map_err(|err| map_slug_write_error(err, COLLECTION, &event.slug))?;

        Ok(event.id)
    }

    fn update_event(&self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE events
                 SET
                    title = ?1,
                    slug = ?2,
                    summary = ?3,
                    venue_id = ?4,
                    organizer_id = ?5,
                    starts_at = ?6,
                    ends_at = ?7,
                    ticket_url = ?8,
                    status = ?9,
                    is_deleted = ?10,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?11;",
                params![
                    event.title.as_str(),
                    event.slug.as_str(),
                    event.summary.as_deref(),
                    event.venue_id.map(|id| id.to_string()),
                    event.organizer_id.map(|id| id.to_string()),
                    event.starts_at,
                    event.ends_at,
                    event.ticket_url.as_deref(),
                    event.status.as_str(),
                    bool_to_int(event.is_deleted),
                    event.id.to_string(),
                ],
            )
            .map_err(|err| map_slug_write_error(err, COLLECTION, &event.slug))?;

        if changed == 0 {
            return Err(RepoError::NotFound(event.id));
        }

        Ok(())
    }

    fn get_event(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} WHERE slug = ?1 AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query([slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(venue_id) = query.venue_id {
            sql.push_str(" AND venue_id = ?");
            bind_values.push(Value::Text(venue_id.to_string()));
        }
        if let Some(organizer_id) = query.organizer_id {
            sql.push_str(" AND organizer_id = ?");
            bind_values.push(Value::Text(organizer_id.to_string()));
        }
        if let Some(starts_after) = query.starts_after {
            sql.push_str(" AND starts_at >= ?");
            bind_values.push(Value::Integer(starts_after));
        }

        sql.push_str(" ORDER BY starts_at ASC, id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }

    fn soft_delete_event(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE events
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = EventStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid event status `{status_text}` in events.status"))
    })?;

    let event = Event {
        id: parse_record_id(&id_text, "events.id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        summary: row.get("summary")?,
        venue_id: parse_optional_record_id(row.get("venue_id")?, "events.venue_id")?,
        organizer_id: parse_optional_record_id(row.get("organizer_id")?, "events.organizer_id")?,
        starts_at: row.get("starts_at")?,
        ends_at: row.get("ends_at")?,
        ticket_url: row.get("ticket_url")?,
        status,
        is_deleted: parse_bool(row.get("is_deleted")?, "events.is_deleted")?,
    };
    event.validate()?;
    Ok(event)
}
