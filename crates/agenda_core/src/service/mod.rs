//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into admin use-case APIs.
//! - Keep callers decoupled from storage details.

pub mod agent_service;
pub mod event_service;
pub mod slug_service;

use crate::model::slug::{slugify, SlugError};
use crate::model::validation::ValidationError;
use crate::repo::{RepoError, RepoResult};

/// Uses `explicit` when it is non-blank, otherwise slugifies `source`.
///
/// An explicit slug is passed through unchanged so record validation can
/// reject non-canonical input instead of silently rewriting it.
pub(crate) fn derive_slug(
    explicit: Option<&str>,
    source: &str,
    source_field: &'static str,
) -> RepoResult<String> {
    if let Some(slug) = explicit.map(str::trim).filter(|slug| !slug.is_empty()) {
        return Ok(slug.to_string());
    }

    slugify(source).map_err(|err| {
        RepoError::Validation(match err {
            SlugError::Empty => ValidationError::EmptyField(source_field),
            SlugError::NoAlphanumeric(value) => ValidationError::InvalidSlug(value),
        })
    })
}
