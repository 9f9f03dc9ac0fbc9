use agenda_core::db::open_shared_db;
use agenda_core::model::agent::{Agent, AgentKind};
use agenda_core::model::event::Event;
use agenda_core::repo::agent_repo::{AgentRepository, SqliteAgentRepository};
use agenda_core::repo::event_repo::{EventRepository, SqliteEventRepository};
use agenda_core::service::slug_service::suggest_unique_slug;
use agenda_core::{
    probe_once, Collection, LookupError, LookupField, LookupRequest, ProbeStatus,
    SqliteUniquenessLookup, UniquenessLookup,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(2);

struct Catalog {
    _dir: tempfile::TempDir,
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    lookup: SqliteUniquenessLookup,
}

impl Catalog {
    fn open() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.sqlite3");
        let conn = open_shared_db(&path).unwrap();
        let lookup = SqliteUniquenessLookup::new(Arc::clone(&conn));
        Self {
            _dir: dir,
            path,
            conn,
            lookup,
        }
    }

    fn add_event(&self, slug: &str) -> Event {
        let event = Event::new(format!("Evento {slug}"), slug, 1_000);
        let conn = self.conn.lock().unwrap();
        SqliteEventRepository::new(&conn).create_event(&event).unwrap();
        event
    }

    fn add_agent(&self, kind: AgentKind, slug: &str, instagram: Option<&str>) -> Agent {
        let mut agent = Agent::new(kind, format!("Agente {slug}"), slug);
        if let Some(handle) = instagram {
            agent.set_instagram(handle);
        }
        let conn = self.conn.lock().unwrap();
        SqliteAgentRepository::new(&conn).create_agent(&agent).unwrap();
        agent
    }
}

#[tokio::test]
async fn existing_slug_is_taken_and_new_slug_is_available() {
    let catalog = Catalog::open();
    catalog.add_event("festival-de-inverno");

    let taken = LookupRequest::new(Collection::Events, LookupField::Slug, "festival-de-inverno", None);
    let free = LookupRequest::new(Collection::Events, LookupField::Slug, "festival-de-verao", None);

    assert_eq!(probe_once(&catalog.lookup, &taken, TIMEOUT).await, ProbeStatus::Taken);
    assert_eq!(probe_once(&catalog.lookup, &free, TIMEOUT).await, ProbeStatus::Available);
}

#[tokio::test]
async fn record_being_edited_never_conflicts_with_itself() {
    let catalog = Catalog::open();
    let event = catalog.add_event("mostra-de-cinema");
    let id = event.id.to_string();

    let own = LookupRequest::new(Collection::Events, LookupField::Slug, "mostra-de-cinema", Some(&id));
    assert_eq!(probe_once(&catalog.lookup, &own, TIMEOUT).await, ProbeStatus::Available);

    catalog.add_event("mostra-de-danca");
    let other =
        LookupRequest::new(Collection::Events, LookupField::Slug, "mostra-de-danca", Some(&id));
    assert_eq!(probe_once(&catalog.lookup, &other, TIMEOUT).await, ProbeStatus::Taken);
}

#[tokio::test]
async fn soft_deleted_rows_still_count() {
    let catalog = Catalog::open();
    let event = catalog.add_event("arraial");
    {
        let conn = catalog.conn.lock().unwrap();
        SqliteEventRepository::new(&conn)
            .soft_delete_event(event.id)
            .unwrap();
    }

    let request = LookupRequest::new(Collection::Events, LookupField::Slug, "arraial", None);
    assert_eq!(catalog.lookup.count_matches(&request).await, Ok(1));
}

#[tokio::test]
async fn agent_lookups_are_scoped_by_kind() {
    let catalog = Catalog::open();
    catalog.add_agent(AgentKind::Artist, "nina", Some("@NinaCanta"));

    let artist = LookupRequest::new(Collection::Artists, LookupField::Slug, "nina", None);
    let organizer = LookupRequest::new(Collection::Organizers, LookupField::Slug, "nina", None);
    assert_eq!(probe_once(&catalog.lookup, &artist, TIMEOUT).await, ProbeStatus::Taken);
    assert_eq!(probe_once(&catalog.lookup, &organizer, TIMEOUT).await, ProbeStatus::Available);

    let handle = LookupRequest::new(Collection::Artists, LookupField::Instagram, " @ninacanta", None);
    assert_eq!(probe_once(&catalog.lookup, &handle, TIMEOUT).await, ProbeStatus::Taken);
}

#[tokio::test]
async fn unsupported_target_is_unknown() {
    let catalog = Catalog::open();

    let request = LookupRequest::new(Collection::Events, LookupField::Instagram, "festa", None);
    assert_eq!(
        catalog.lookup.count_matches(&request).await,
        Err(LookupError::UnsupportedTarget {
            collection: Collection::Events,
            field: LookupField::Instagram,
        })
    );
    assert_eq!(probe_once(&catalog.lookup, &request, TIMEOUT).await, ProbeStatus::Unknown);
}

#[tokio::test]
async fn blank_candidate_is_unknown_without_querying() {
    let catalog = Catalog::open();
    catalog.add_event("x");

    let request = LookupRequest::new(Collection::Events, LookupField::Slug, "   ", None);
    assert_eq!(request.candidate, "");
    assert_eq!(probe_once(&catalog.lookup, &request, TIMEOUT).await, ProbeStatus::Unknown);
}

#[tokio::test]
async fn handles_that_cannot_be_stored_are_unknown() {
    let catalog = Catalog::open();

    for candidate in ["@", " @ ", "casa do samba"] {
        let request =
            LookupRequest::new(Collection::Artists, LookupField::Instagram, candidate, None);
        assert!(matches!(
            catalog.lookup.count_matches(&request).await,
            Err(LookupError::InvalidCandidate(_))
        ));
        assert_eq!(
            probe_once(&catalog.lookup, &request, TIMEOUT).await,
            ProbeStatus::Unknown,
            "candidate {candidate:?}"
        );
    }
}

#[tokio::test]
async fn locked_catalog_resolves_unknown_within_timeout() {
    let catalog = Catalog::open();
    catalog.add_event("x");

    let writer = Connection::open(&catalog.path).unwrap();
    writer.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let request = LookupRequest::new(Collection::Events, LookupField::Slug, "x", None);
    let started = Instant::now();
    let status = probe_once(&catalog.lookup, &request, Duration::from_millis(100)).await;
    let elapsed = started.elapsed();

    assert_eq!(status, ProbeStatus::Unknown);
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");

    writer.execute_batch("ROLLBACK;").unwrap();
}

#[tokio::test]
async fn suggestion_skips_taken_variants_in_catalog() {
    let catalog = Catalog::open();
    catalog.add_event("virada-cultural");
    catalog.add_event("virada-cultural-2");

    let slug = suggest_unique_slug(
        &catalog.lookup,
        Collection::Events,
        "Virada Cultural",
        None,
        10,
        TIMEOUT,
    )
    .await;
    assert_eq!(slug.as_deref(), Some("virada-cultural-3"));
}
