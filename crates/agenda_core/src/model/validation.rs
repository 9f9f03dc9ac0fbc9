//! Field-level validation shared by catalog records.
//!
//! # Responsibility
//! - Provide one error type for record validation failures.
//! - Keep reusable field checks (text bounds, slug, handle, url) in one place.

use crate::model::slug::{is_valid_handle, is_valid_slug, MAX_HANDLE_CHARS, MAX_SLUG_CHARS};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum length for titles and display names.
pub const MAX_NAME_CHARS: usize = 200;
/// Maximum length for long-form text such as summaries and bios.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Validation failure for one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    InvalidSlug(String),
    InvalidHandle(String),
    InvalidUrl {
        field: &'static str,
        value: String,
    },
    InvalidTimeRange {
        start: i64,
        end: i64,
    },
    InvalidStateCode(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} cannot be empty"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::InvalidSlug(value) => write!(
                f,
                "slug `{value}` must be lowercase letters, digits and single dashes (max {MAX_SLUG_CHARS})"
            ),
            Self::InvalidHandle(value) => write!(
                f,
                "instagram handle `{value}` must be letters, digits, `.` or `_` (max {MAX_HANDLE_CHARS})"
            ),
            Self::InvalidUrl { field, value } => {
                write!(f, "{field} `{value}` must start with http:// or https://")
            }
            Self::InvalidTimeRange { start, end } => {
                write!(f, "end {end} is earlier than start {start}")
            }
            Self::InvalidStateCode(value) => {
                write!(f, "state `{value}` must be a two-letter uppercase code")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    optional_text(field, Some(value), max_chars)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.chars().count() > max_chars => {
            Err(ValidationError::TooLong { field, max_chars })
        }
        _ => Ok(()),
    }
}

pub(crate) fn require_slug(value: &str) -> Result<(), ValidationError> {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlug(value.to_string()))
    }
}

pub(crate) fn optional_handle(value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(handle) if !is_valid_handle(handle) => {
            Err(ValidationError::InvalidHandle(handle.to_string()))
        }
        _ => Ok(()),
    }
}

pub(crate) fn optional_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
            Err(ValidationError::InvalidUrl {
                field,
                value: url.to_string(),
            })
        }
        _ => Ok(()),
    }
}
