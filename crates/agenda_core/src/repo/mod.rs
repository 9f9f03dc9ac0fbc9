//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per catalog record.
//! - Isolate SQLite query details from services and the probe engine.
//!
//! # Invariants
//! - Write paths call `validate()` on the record before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Unique-constraint failures surface as semantic conflicts, not raw
//!   SQLite errors; the store is the authority on slug uniqueness.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod agent_repo;
pub mod event_repo;
pub mod lookup_repo;
pub mod venue_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all catalog tables.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(RecordId),
    /// Another record in `collection` already owns `slug`.
    SlugConflict {
        collection: &'static str,
        slug: String,
    },
    /// A non-slug unique key is already taken.
    Duplicate(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::SlugConflict { collection, slug } => {
                write!(f, "slug `{slug}` is already taken in {collection}")
            }
            Self::Duplicate(message) => write!(f, "duplicate record: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::SlugConflict { .. }
            | Self::Duplicate(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a UNIQUE violation on a slug write to `RepoError::SlugConflict`.
pub(crate) fn map_slug_write_error(
    err: rusqlite::Error,
    collection: &'static str,
    slug: &str,
) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::SlugConflict {
            collection,
            slug: slug.to_string(),
        };
    }
    err.into()
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("UNIQUE"))
        }
        _ => false,
    }
}

pub(crate) fn parse_record_id(value: &str, column: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_record_id(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<RecordId>> {
    value
        .map(|text| parse_record_id(&text, column))
        .transpose()
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Appends `LIMIT`/`OFFSET` clauses with SQLite's "no limit" idiom.
pub(crate) fn push_pagination(
    sql: &mut String,
    bind_values: &mut Vec<rusqlite::types::Value>,
    limit: Option<u32>,
    offset: u32,
) {
    use rusqlite::types::Value;

    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}
