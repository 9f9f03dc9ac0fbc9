//! Unique slug suggestions backed by the uniqueness lookup port.

use crate::model::slug::{next_slug_variant, slugify};
use crate::probe::lookup::{probe_once, Collection, LookupField, LookupRequest, UniquenessLookup};
use crate::probe::status::ProbeStatus;
use log::debug;
use std::time::Duration;

/// Suggests the first free slug derived from `text`: `base`, `base-2`, `base-3`, ...
///
/// Returns `None` when `text` has no usable characters, when the lookup
/// cannot answer (any `Unknown` stops the search), or when `max_attempts`
/// variants are all taken.
pub async fn suggest_unique_slug<L>(
    lookup: &L,
    collection: Collection,
    text: &str,
    exclude_id: Option<&str>,
    max_attempts: u32,
    timeout: Duration,
) -> Option<String>
where
    L: UniquenessLookup + ?Sized,
{
    let base = slugify(text).ok()?;

    for attempt in 1..=max_attempts {
        let candidate = next_slug_variant(&base, attempt);
        let request = LookupRequest::new(collection, LookupField::Slug, &candidate, exclude_id);
        match probe_once(lookup, &request, timeout).await {
            ProbeStatus::Available => return Some(candidate),
            ProbeStatus::Taken => {
                debug!(
                    "event=slug_suggest module=service status=taken collection={} attempt={}",
                    collection, attempt
                );
            }
            ProbeStatus::Unknown => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::suggest_unique_slug;
    use crate::probe::lookup::{Collection, LookupError, LookupRequest, UniquenessLookup};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(1);

    struct TakenSet(HashSet<&'static str>);

    #[async_trait]
    impl UniquenessLookup for TakenSet {
        async fn count_matches(&self, request: &LookupRequest) -> Result<u64, LookupError> {
            Ok(u64::from(self.0.contains(request.candidate.as_str())))
        }
    }

    struct Broken;

    #[async_trait]
    impl UniquenessLookup for Broken {
        async fn count_matches(&self, _request: &LookupRequest) -> Result<u64, LookupError> {
            Err(LookupError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn suggests_first_free_numbered_variant() {
        let lookup = TakenSet(HashSet::from(["meu-evento", "meu-evento-2"]));
        let slug =
            suggest_unique_slug(&lookup, Collection::Events, "Meu Evento", None, 5, TIMEOUT).await;
        assert_eq!(slug.as_deref(), Some("meu-evento-3"));
    }

    #[tokio::test]
    async fn gives_up_when_lookup_cannot_answer() {
        let slug =
            suggest_unique_slug(&Broken, Collection::Events, "Meu Evento", None, 5, TIMEOUT).await;
        assert_eq!(slug, None);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let lookup = TakenSet(HashSet::from(["show", "show-2"]));
        let slug = suggest_unique_slug(&lookup, Collection::Venues, "Show", None, 2, TIMEOUT).await;
        assert_eq!(slug, None);
    }
}
