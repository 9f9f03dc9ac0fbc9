//! SQLite adapter for the uniqueness lookup port.
//!
//! # Responsibility
//! - Answer `UniquenessLookup` requests against catalog tables.
//! - Keep the (collection, field) to SQL mapping whitelisted; request
//!   strings never reach SQL text.
//!
//! # Invariants
//! - Counts include soft-deleted rows, matching the unique constraints they
//!   would collide with at write time.
//! - Instagram candidates are normalized the same way records store them;
//!   a handle that could never be stored is an error, not a free value.
//! - Async lookups run on the blocking pool so callers' timeouts stay live
//!   while SQLite waits on a locked catalog file.

use crate::db::{lock_catalog, DbError, SharedCatalog};
use crate::model::slug::{is_valid_handle, normalize_handle};
use crate::probe::lookup::{Collection, LookupError, LookupField, LookupRequest, UniquenessLookup};
use async_trait::async_trait;
use log::{error, warn};
use rusqlite::params;

/// Uniqueness lookups served from a shared catalog connection.
#[derive(Clone)]
pub struct SqliteUniquenessLookup {
    catalog: SharedCatalog,
}

impl SqliteUniquenessLookup {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }

    /// Synchronous variant for callers outside an async runtime.
    pub fn count_matches_blocking(&self, request: &LookupRequest) -> Result<u64, LookupError> {
        let sql = lookup_sql(request.collection, request.field)?;
        let candidate = match request.field {
            LookupField::Slug => request.candidate.clone(),
            LookupField::Instagram => normalize_handle(&request.candidate)
                .filter(|handle| is_valid_handle(handle))
                .ok_or_else(|| LookupError::InvalidCandidate(request.candidate.clone()))?,
        };

        let count: i64 = lock_catalog(&self.catalog)
            .and_then(|conn| {
                conn.query_row(sql, params![candidate, request.exclude_id.as_deref()], |row| {
                    row.get(0)
                })
                .map_err(DbError::from)
            })
            .map_err(|err| {
                let status = if err.is_busy() { "busy" } else { "error" };
                error!(
                    "event=lookup_query module=repo status={} collection={} field={} error={}",
                    status, request.collection, request.field, err
                );
                LookupError::Unavailable(err.to_string())
            })?;

        match_count(count)
    }
}

#[async_trait]
impl UniquenessLookup for SqliteUniquenessLookup {
    async fn count_matches(&self, request: &LookupRequest) -> Result<u64, LookupError> {
        let lookup = self.clone();
        let owned = request.clone();
        tokio::task::spawn_blocking(move || lookup.count_matches_blocking(&owned))
            .await
            .map_err(|err| {
                warn!(
                    "event=lookup_query module=repo status=join_error collection={} field={} error={}",
                    request.collection, request.field, err
                );
                LookupError::Unavailable(format!("lookup task failed: {err}"))
            })?
    }
}

fn match_count(count: i64) -> Result<u64, LookupError> {
    u64::try_from(count)
        .map_err(|_| LookupError::Unavailable(format!("catalog returned negative count {count}")))
}

fn lookup_sql(collection: Collection, field: LookupField) -> Result<&'static str, LookupError> {
    let sql = match (collection, field) {
        (Collection::Events, LookupField::Slug) => {
            "SELECT COUNT(*) FROM events WHERE slug = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Venues, LookupField::Slug) => {
            "SELECT COUNT(*) FROM venues WHERE slug = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Artists, LookupField::Slug) => {
            "SELECT COUNT(*) FROM agents
             WHERE kind = 'artist' AND slug = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Organizers, LookupField::Slug) => {
            "SELECT COUNT(*) FROM agents
             WHERE kind = 'organizer' AND slug = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Artists, LookupField::Instagram) => {
            "SELECT COUNT(*) FROM agents
             WHERE kind = 'artist' AND instagram = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Organizers, LookupField::Instagram) => {
            "SELECT COUNT(*) FROM agents
             WHERE kind = 'organizer' AND instagram = ?1 AND (?2 IS NULL OR id <> ?2);"
        }
        (Collection::Events | Collection::Venues, LookupField::Instagram) => {
            return Err(LookupError::UnsupportedTarget { collection, field });
        }
    };
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::{match_count, SqliteUniquenessLookup};
    use crate::db::open_db_in_memory;
    use crate::probe::lookup::{Collection, LookupError, LookupField, LookupRequest};
    use std::sync::{Arc, Mutex};

    fn empty_catalog() -> SqliteUniquenessLookup {
        SqliteUniquenessLookup::new(Arc::new(Mutex::new(open_db_in_memory().unwrap())))
    }

    #[test]
    fn handles_that_cannot_be_stored_are_rejected() {
        let lookup = empty_catalog();

        for candidate in ["@", "casa do samba", "acentuação"] {
            let request =
                LookupRequest::new(Collection::Artists, LookupField::Instagram, candidate, None);
            assert_eq!(
                lookup.count_matches_blocking(&request),
                Err(LookupError::InvalidCandidate(request.candidate.clone())),
                "candidate {candidate:?}"
            );
        }

        let valid =
            LookupRequest::new(Collection::Organizers, LookupField::Instagram, "@Casa.Do_Samba", None);
        assert_eq!(lookup.count_matches_blocking(&valid), Ok(0));
    }

    #[test]
    fn negative_count_is_unavailable() {
        assert_eq!(match_count(3), Ok(3));
        assert!(matches!(match_count(-1), Err(LookupError::Unavailable(_))));
    }
}
