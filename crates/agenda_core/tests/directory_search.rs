use agenda_core::db::open_db_in_memory;
use agenda_core::model::agent::{Agent, AgentKind};
use agenda_core::model::venue::{City, Venue};
use agenda_core::repo::agent_repo::{AgentRepository, SqliteAgentRepository};
use agenda_core::repo::venue_repo::{SqliteVenueRepository, VenueRepository};
use agenda_core::search::live::LiveSearch;
use agenda_core::{search_directory, DirectoryKind, DirectoryQuery};
use rusqlite::Connection;
use std::time::{Duration, Instant};

fn seeded_catalog() -> Connection {
    let conn = open_db_in_memory().unwrap();
    {
        let venues = SqliteVenueRepository::new(&conn);
        venues.create_city(&City::new("São Paulo", "SP")).unwrap();
        venues.create_city(&City::new("São Luís", "MA")).unwrap();
        venues.create_city(&City::new("Belém", "PA")).unwrap();

        let mut venue = Venue::new("Sala São Paulo", "sala-sao-paulo");
        venue.address = Some("Praça Júlio Prestes, 16".to_string());
        venues.create_venue(&venue).unwrap();

        let closed = Venue::new("Paulo Cine Antigo", "paulo-cine-antigo");
        venues.create_venue(&closed).unwrap();
        venues.soft_delete_venue(closed.id).unwrap();

        let agents = SqliteAgentRepository::new(&conn);
        let mut artist = Agent::new(AgentKind::Artist, "Paulinho da Viola", "paulinho-da-viola");
        artist.set_instagram("@paulinhodaviola");
        agents.create_agent(&artist).unwrap();
    }
    conn
}

#[test]
fn search_is_accent_insensitive() {
    let conn = seeded_catalog();

    let hits = search_directory(&conn, &DirectoryQuery::new("sao")).unwrap();
    let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();
    assert_eq!(names, ["São Luís", "São Paulo", "Sala São Paulo"]);

    let belem = search_directory(&conn, &DirectoryQuery::new("BELEM")).unwrap();
    assert_eq!(belem.len(), 1);
    assert_eq!(belem[0].kind, DirectoryKind::City);
    assert_eq!(belem[0].detail.as_deref(), Some("PA"));
    assert_eq!(belem[0].slug, None);
}

#[test]
fn every_term_must_match() {
    let conn = seeded_catalog();

    let hits = search_directory(&conn, &DirectoryQuery::new("sala paulo")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].slug.as_deref(), Some("sala-sao-paulo"));
}

#[test]
fn prefix_matches_rank_first_and_deleted_rows_are_hidden() {
    let conn = seeded_catalog();

    let hits = search_directory(&conn, &DirectoryQuery::new("paul")).unwrap();
    let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();
    assert_eq!(
        names,
        ["Paulinho da Viola", "Sala São Paulo", "São Paulo"]
    );
}

#[test]
fn kind_filter_and_limit_are_applied() {
    let conn = seeded_catalog();

    let artists = search_directory(
        &conn,
        &DirectoryQuery::new("paul").with_kind(DirectoryKind::Artist),
    )
    .unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].detail.as_deref(), Some("paulinhodaviola"));

    let limited = search_directory(&conn, &DirectoryQuery::new("sao").with_limit(1)).unwrap();
    assert_eq!(limited.len(), 1);

    let none = search_directory(&conn, &DirectoryQuery::new("sao").with_limit(0)).unwrap();
    assert!(none.is_empty());
}

#[test]
fn wildcards_in_query_are_literal() {
    let conn = seeded_catalog();

    assert!(search_directory(&conn, &DirectoryQuery::new("%")).unwrap().is_empty());
    assert!(search_directory(&conn, &DirectoryQuery::new("   ")).unwrap().is_empty());
}

#[test]
fn live_search_runs_latest_query_only() {
    let conn = seeded_catalog();
    let mut session = LiveSearch::new(Duration::from_millis(300));
    let start = Instant::now();

    session.input("sa", start);
    session.input("sao", start + Duration::from_millis(100));
    assert!(session.poll(start + Duration::from_millis(200)).is_none());

    let ticket = session.poll(start + Duration::from_millis(400)).unwrap();
    assert_eq!(ticket.text, "sao");
    assert!(session.is_searching());

    let hits = search_directory(&conn, &DirectoryQuery::new(ticket.text.as_str())).unwrap();
    assert!(session.complete(ticket.seq, hits));
    assert_eq!(session.results().len(), 3);
    assert!(!session.is_searching());
}
