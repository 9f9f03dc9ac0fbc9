//! Uniqueness lookup port and one-shot prober.
//!
//! # Responsibility
//! - Define the request/response contract between the prober and the data
//!   source ("does any record in collection X have field F equal to the
//!   candidate, other than record exclude-id?").
//! - Classify lookup outcomes into the tri-state `ProbeStatus`.
//!
//! # Invariants
//! - Blank candidates never reach the data source.
//! - Any lookup error or timeout classifies as `Unknown`; never as
//!   `Available` (would let a duplicate through) nor `Taken` (would block
//!   legitimate input).

use crate::probe::status::ProbeStatus;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Collection whose records are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Events,
    Artists,
    Organizers,
    Venues,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Artists => "artists",
            Self::Organizers => "organizers",
            Self::Venues => "venues",
        }
    }
}

impl FromStr for Collection {
    type Err = LookupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "events" => Ok(Self::Events),
            "artists" => Ok(Self::Artists),
            "organizers" => Ok(Self::Organizers),
            "venues" => Ok(Self::Venues),
            other => Err(LookupError::UnknownCollection(other.to_string())),
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field whose value must be unique within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    Slug,
    Instagram,
}

impl LookupField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Instagram => "instagram",
        }
    }
}

impl FromStr for LookupField {
    type Err = LookupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slug" => Ok(Self::Slug),
            "instagram" => Ok(Self::Instagram),
            other => Err(LookupError::UnknownField(other.to_string())),
        }
    }
}

impl Display for LookupField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uniqueness question for the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub collection: Collection,
    pub field: LookupField,
    /// Pre-trimmed candidate value.
    pub candidate: String,
    /// Record being edited; never counts as a conflict with itself.
    pub exclude_id: Option<String>,
}

impl LookupRequest {
    /// Builds a request, trimming the candidate and dropping a blank exclude-id.
    pub fn new(
        collection: Collection,
        field: LookupField,
        candidate: &str,
        exclude_id: Option<&str>,
    ) -> Self {
        Self {
            collection,
            field,
            candidate: candidate.trim().to_string(),
            exclude_id: exclude_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }
}

/// Lookup failure. Every variant maps to `ProbeStatus::Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    UnknownCollection(String),
    UnknownField(String),
    /// The (collection, field) pair is not probeable, e.g. `events.instagram`.
    UnsupportedTarget {
        collection: Collection,
        field: LookupField,
    },
    /// The candidate can never be stored in the field, e.g. a handle with spaces.
    InvalidCandidate(String),
    /// Transport or query failure reported by the data source.
    Unavailable(String),
    TimedOut(Duration),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCollection(value) => write!(f, "unknown collection `{value}`"),
            Self::UnknownField(value) => write!(f, "unknown lookup field `{value}`"),
            Self::UnsupportedTarget { collection, field } => {
                write!(f, "{collection}.{field} does not support uniqueness lookups")
            }
            Self::InvalidCandidate(value) => write!(f, "`{value}` is not a valid candidate"),
            Self::Unavailable(message) => write!(f, "lookup unavailable: {message}"),
            Self::TimedOut(timeout) => {
                write!(f, "lookup timed out after {} ms", timeout.as_millis())
            }
        }
    }
}

impl Error for LookupError {}

/// Data source able to answer uniqueness questions.
///
/// Implementations only need to count matching records; the prober cares
/// about `count > 0` versus `count == 0`.
#[async_trait]
pub trait UniquenessLookup: Send + Sync {
    async fn count_matches(&self, request: &LookupRequest) -> Result<u64, LookupError>;
}

/// Maps a match count to a resolved probe status.
pub fn classify(matches: u64) -> ProbeStatus {
    if matches > 0 {
        ProbeStatus::Taken
    } else {
        ProbeStatus::Available
    }
}

/// Runs one bounded uniqueness lookup without debouncing.
///
/// Blank candidates short-circuit to `Unknown` without touching `lookup`.
pub async fn probe_once<L>(lookup: &L, request: &LookupRequest, timeout: Duration) -> ProbeStatus
where
    L: UniquenessLookup + ?Sized,
{
    if request.candidate.trim().is_empty() {
        return ProbeStatus::Unknown;
    }

    let outcome = match tokio::time::timeout(timeout, lookup.count_matches(request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(LookupError::TimedOut(timeout)),
    };

    match outcome {
        Ok(matches) => {
            let status = classify(matches);
            debug!(
                "event=probe_once module=probe status=ok collection={} field={} matches={} result={}",
                request.collection,
                request.field,
                matches,
                status.as_str()
            );
            status
        }
        Err(err) => {
            warn!(
                "event=probe_once module=probe status=error collection={} field={} error={}",
                request.collection, request.field, err
            );
            ProbeStatus::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify, probe_once, Collection, LookupError, LookupField, LookupRequest,
        UniquenessLookup,
    };
    use crate::probe::status::ProbeStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct FixedLookup {
        outcome: Result<u64, LookupError>,
        calls: AtomicUsize,
    }

    impl FixedLookup {
        fn new(outcome: Result<u64, LookupError>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UniquenessLookup for FixedLookup {
        async fn count_matches(&self, _request: &LookupRequest) -> Result<u64, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct StalledLookup;

    #[async_trait]
    impl UniquenessLookup for StalledLookup {
        async fn count_matches(&self, _request: &LookupRequest) -> Result<u64, LookupError> {
            std::future::pending::<()>().await;
            Ok(0)
        }
    }

    /// Rows of `(id, slug)`; honours `exclude_id` like the SQLite adapter.
    struct RowsLookup(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl UniquenessLookup for RowsLookup {
        async fn count_matches(&self, request: &LookupRequest) -> Result<u64, LookupError> {
            let matches = self
                .0
                .iter()
                .filter(|(id, slug)| {
                    *slug == request.candidate && request.exclude_id.as_deref() != Some(*id)
                })
                .count();
            Ok(matches as u64)
        }
    }

    fn slug_request(candidate: &str) -> LookupRequest {
        LookupRequest::new(Collection::Events, LookupField::Slug, candidate, None)
    }

    #[test]
    fn request_trims_candidate_and_drops_blank_exclude_id() {
        let request = LookupRequest::new(
            Collection::Venues,
            LookupField::Slug,
            "  teatro-municipal ",
            Some("  "),
        );
        assert_eq!(request.candidate, "teatro-municipal");
        assert_eq!(request.exclude_id, None);
    }

    #[test]
    fn collection_and_field_parse_from_strings() {
        assert_eq!("Events".parse::<Collection>(), Ok(Collection::Events));
        assert_eq!("instagram".parse::<LookupField>(), Ok(LookupField::Instagram));
        assert_eq!(
            "posts".parse::<Collection>(),
            Err(LookupError::UnknownCollection("posts".to_string()))
        );
    }

    #[test]
    fn classify_uses_count_only() {
        assert_eq!(classify(0), ProbeStatus::Available);
        assert_eq!(classify(1), ProbeStatus::Taken);
        assert_eq!(classify(7), ProbeStatus::Taken);
    }

    #[tokio::test]
    async fn blank_candidate_never_reaches_lookup() {
        let lookup = FixedLookup::new(Ok(1));
        for candidate in ["", "   ", "\t\n"] {
            let status = probe_once(&lookup, &slug_request(candidate), TIMEOUT).await;
            assert_eq!(status, ProbeStatus::Unknown);
        }
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_error_maps_to_unknown() {
        let lookup = FixedLookup::new(Err(LookupError::Unavailable("connection reset".into())));
        let status = probe_once(&lookup, &slug_request("meu-evento"), TIMEOUT).await;
        assert_eq!(status, ProbeStatus::Unknown);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_lookup_times_out_to_unknown() {
        let status = probe_once(&StalledLookup, &slug_request("meu-evento"), TIMEOUT).await;
        assert_eq!(status, ProbeStatus::Unknown);
    }

    #[tokio::test]
    async fn editing_record_may_keep_its_own_slug() {
        let lookup = RowsLookup(vec![("42", "show-de-rock")]);

        let own = LookupRequest::new(Collection::Events, LookupField::Slug, "show-de-rock", Some("42"));
        assert_eq!(probe_once(&lookup, &own, TIMEOUT).await, ProbeStatus::Available);

        let other = LookupRequest::new(Collection::Events, LookupField::Slug, "show-de-rock", Some("7"));
        assert_eq!(probe_once(&lookup, &other, TIMEOUT).await, ProbeStatus::Taken);
    }
}
