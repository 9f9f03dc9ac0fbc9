//! Name search over the catalog directory (cities, venues, artists, organizers).
//!
//! # Responsibility
//! - Back the city/venue/organizer pickers of admin forms.
//! - Return typed hits with stable IDs.
//!
//! # Invariants
//! - Matching is accent- and case-insensitive via the `search_name` column.
//! - Every whitespace-separated term must match somewhere in the name.
//! - Soft-deleted rows are never returned.
//! - Ordering is deterministic: prefix matches first, then name, then id.

use crate::db::DbError;
use crate::model::slug::fold_for_search;
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default number of hits returned by a directory query.
pub const DEFAULT_LIMIT: u32 = 20;
/// Upper bound applied to caller-provided limits.
pub const MAX_LIMIT: u32 = 50;

const DIRECTORY_SQL: &str = "SELECT id, kind, name, slug, detail, search_name FROM (
    SELECT id, 'city' AS kind, name, NULL AS slug, state AS detail, search_name
    FROM cities
    UNION ALL
    SELECT id, 'venue' AS kind, name, slug, address AS detail, search_name
    FROM venues
    WHERE is_deleted = 0
    UNION ALL
    SELECT id, kind, name, slug, instagram AS detail, search_name
    FROM agents
    WHERE is_deleted = 0
) WHERE 1 = 1";

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryKind {
    City,
    Venue,
    Artist,
    Organizer,
}

impl DirectoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Venue => "venue",
            Self::Artist => "artist",
            Self::Organizer => "organizer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "city" => Some(Self::City),
            "venue" => Some(Self::Venue),
            "artist" => Some(Self::Artist),
            "organizer" => Some(Self::Organizer),
            _ => None,
        }
    }
}

/// Search options for directory lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    /// User query text.
    pub text: String,
    /// Optional kind filter.
    pub kind: Option<DirectoryKind>,
    /// Maximum number of hits; clamped to `MAX_LIMIT`.
    pub limit: u32,
}

impl DirectoryQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_kind(mut self, kind: DirectoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Single directory hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryHit {
    pub id: RecordId,
    pub kind: DirectoryKind,
    pub name: String,
    /// `None` for cities.
    pub slug: Option<String>,
    /// State for cities, address for venues, Instagram handle for agents.
    pub detail: Option<String>,
}

/// Searches the directory and returns ranked hits.
///
/// Returns an empty list for blank queries or a zero limit.
pub fn search_directory(
    conn: &Connection,
    query: &DirectoryQuery,
) -> SearchResult<Vec<DirectoryHit>> {
    let terms = fold_for_search(&query.text)
        .split_whitespace()
        .map(escape_like_term)
        .collect::<Vec<_>>();
    let Some(first_term) = terms.first() else {
        return Ok(Vec::new());
    };

    let limit = query.limit.min(MAX_LIMIT);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(DIRECTORY_SQL);
    let mut bind_values: Vec<Value> = Vec::new();

    for term in &terms {
        sql.push_str(" AND search_name LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(format!("%{term}%")));
    }

    if let Some(kind) = query.kind {
        sql.push_str(" AND kind = ?");
        bind_values.push(Value::Text(kind.as_str().to_string()));
    }

    sql.push_str(
        " ORDER BY CASE WHEN search_name LIKE ? ESCAPE '\\' THEN 0 ELSE 1 END,
           search_name ASC, id ASC LIMIT ?",
    );
    bind_values.push(Value::Text(format!("{first_term}%")));
    bind_values.push(Value::Integer(i64::from(limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hits = Vec::new();

    while let Some(row) = rows.next()? {
        hits.push(parse_directory_hit(row)?);
    }

    Ok(hits)
}

fn parse_directory_hit(row: &Row<'_>) -> SearchResult<DirectoryHit> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| SearchError::InvalidData(format!("invalid uuid `{id_text}`")))?;

    let kind_text: String = row.get("kind")?;
    let kind = DirectoryKind::parse(&kind_text)
        .ok_or_else(|| SearchError::InvalidData(format!("invalid kind `{kind_text}`")))?;

    Ok(DirectoryHit {
        id,
        kind,
        name: row.get("name")?,
        slug: row.get("slug")?,
        detail: row.get("detail")?,
    })
}

fn escape_like_term(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
