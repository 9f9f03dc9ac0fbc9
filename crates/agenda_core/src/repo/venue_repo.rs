//! Venue and city repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Venue slugs are globally unique.
//! - Cities are unique by `(name, state)`; they are reference data and are
//!   never soft-deleted.

use crate::model::slug::fold_for_search;
use crate::model::venue::{City, Venue};
use crate::model::RecordId;
use crate::repo::{
    bool_to_int, is_unique_violation, map_slug_write_error, parse_bool, parse_optional_record_id,
    parse_record_id, push_pagination, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const VENUE_SELECT_SQL: &str = "SELECT
    id,
    name,
    slug,
    address,
    city_id,
    capacity,
    is_deleted
FROM venues";

const COLLECTION: &str = "venues";

/// Query options for listing venues.
#[derive(Debug, Clone, Default)]
pub struct VenueListQuery {
    pub city_id: Option<RecordId>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for venue and city operations.
pub trait VenueRepository {
    fn create_venue(&self, venue: &Venue) -> RepoResult<RecordId>;
    fn update_venue(&self, venue: &Venue) -> RepoResult<()>;
    fn get_venue(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Venue>>;
    fn get_venue_by_slug(&self, slug: &str) -> RepoResult<Option<Venue>>;
    fn list_venues(&self, query: &VenueListQuery) -> RepoResult<Vec<Venue>>;
    fn soft_delete_venue(&self, id: RecordId) -> RepoResult<()>;
    fn create_city(&self, city: &City) -> RepoResult<RecordId>;
    fn get_city(&self, id: RecordId) -> RepoResult<Option<City>>;
}

/// SQLite-backed venue/city repository.
pub struct SqliteVenueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVenueRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VenueRepository for SqliteVenueRepository<'_> {
    fn create_venue(&self, venue: &Venue) -> RepoResult<RecordId> {
        venue.validate()?;

        self.conn
            .execute(
                "INSERT INTO venues (
                    id,
                    name,
                    slug,
                    address,
                    city_id,
                    capacity,
                    search_name,
                    is_deleted
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    venue.id.to_string(),
                    venue.name.as_str(),
                    venue.slug.as_str(),
                    venue.address.as_deref(),
                    venue.city_id.map(|id| id.to_string()),
                    venue.capacity,
                    fold_for_search(&venue.name),
                    bool_to_int(venue.is_deleted),
                ],
            )
            .map_err(|err| map_slug_write_error(err, COLLECTION, &venue.slug))?;

        Ok(venue.id)
    }

    fn update_venue(&self, venue: &Venue) -> RepoResult<()> {
        venue.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE venues
                 SET
                    name = ?1,
                    slug = ?2,
                    address = ?3,
                    city_id = ?4,
                    capacity = ?5,
                    search_name = ?6,
                    is_deleted = ?7,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?8;",
                params![
                    venue.name.as_str(),
                    venue.slug.as_str(),
                    venue.address.as_deref(),
                    venue.city_id.map(|id| id.to_string()),
                    venue.capacity,
                    fold_for_search(&venue.name),
                    bool_to_int(venue.is_deleted),
                    venue.id.to_string(),
                ],
            )
            .map_err(|err| map_slug_write_error(err, COLLECTION, &venue.slug))?;

        if changed == 0 {
            return Err(RepoError::NotFound(venue.id));
        }

        Ok(())
    }

    fn get_venue(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Venue>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VENUE_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_venue_row(row)?));
        }

        Ok(None)
    }

    fn get_venue_by_slug(&self, slug: &str) -> RepoResult<Option<Venue>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VENUE_SELECT_SQL} WHERE slug = ?1 AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query([slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_venue_row(row)?));
        }

        Ok(None)
    }

    fn list_venues(&self, query: &VenueListQuery) -> RepoResult<Vec<Venue>> {
        let mut sql = format!("{VENUE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }
        if let Some(city_id) = query.city_id {
            sql.push_str(" AND city_id = ?");
            bind_values.push(Value::Text(city_id.to_string()));
        }

        sql.push_str(" ORDER BY search_name ASC, id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut venues = Vec::new();

        while let Some(row) = rows.next()? {
            venues.push(parse_venue_row(row)?);
        }

        Ok(venues)
    }

    fn soft_delete_venue(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE venues
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

    fn create_city(&self, city: &City) -> RepoResult<RecordId> {
        city.validate()?;

        self.conn
            .execute(
                "INSERT INTO cities (id, name, state, search_name) VALUES (?1, ?2, ?3, ?4);",
                params![
                    city.id.to_string(),
                    city.name.as_str(),
                    city.state.as_str(),
                    fold_for_search(&city.name),
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Duplicate(format!("city {}/{}", city.name, city.state))
                } else {
                    err.into()
                }
            })?;

        Ok(city.id)
    }

    fn get_city(&self, id: RecordId) -> RepoResult<Option<City>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, state FROM cities WHERE id = ?1;")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let city = City {
                id: parse_record_id(&id_text, "cities.id")?,
                name: row.get("name")?,
                state: row.get("state")?,
            };
            city.validate()?;
            return Ok(Some(city));
        }

        Ok(None)
    }
}

fn parse_venue_row(row: &Row<'_>) -> RepoResult<Venue> {
    let id_text: String = row.get("id")?;
    let capacity = match row.get::<_, Option<i64>>("capacity")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid capacity `{value}` in venues.capacity"))
        })?),
        None => None,
    };

    let venue = Venue {
        id: parse_record_id(&id_text, "venues.id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        address: row.get("address")?,
        city_id: parse_optional_record_id(row.get("city_id")?, "venues.city_id")?,
        capacity,
        is_deleted: parse_bool(row.get("is_deleted")?, "venues.is_deleted")?,
    };
    venue.validate()?;
    Ok(venue)
}
