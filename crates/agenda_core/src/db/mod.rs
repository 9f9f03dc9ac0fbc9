//! Catalog database: connection setup, sharing and schema versions.
//!
//! # Responsibility
//! - Hand out migrated catalog connections, plain or shared with lookups.
//! - Classify SQLite failures the lookup path reports differently.
//!
//! # Invariants
//! - The catalog schema version lives in `PRAGMA user_version`.
//! - Event, agent and venue tables are only read after migrations succeed.
//! - A shared catalog connection is locked for one statement at a time.

use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_shared_db};

pub type DbResult<T> = Result<T, DbError>;

/// Catalog connection shared between the admin services and async lookups.
pub type SharedCatalog = Arc<Mutex<Connection>>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A thread panicked while holding the shared catalog connection.
    CatalogLockPoisoned,
}

impl DbError {
    /// True when another connection holds a lock on the catalog file.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Locks the shared catalog connection for a single statement.
pub fn lock_catalog(catalog: &SharedCatalog) -> DbResult<MutexGuard<'_, Connection>> {
    catalog.lock().map_err(|_| DbError::CatalogLockPoisoned)
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::CatalogLockPoisoned => f.write_str("shared catalog connection lock poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::CatalogLockPoisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
