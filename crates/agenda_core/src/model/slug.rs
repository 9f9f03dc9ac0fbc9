//! Slug and handle normalization helpers.
//!
//! # Responsibility
//! - Derive URL-safe slugs from free-form titles and names.
//! - Normalize Instagram handles to the stored canonical form.
//! - Fold Latin diacritics so search and slugs agree on spelling.
//!
//! # Invariants
//! - A valid slug matches `^[a-z0-9]+(-[a-z0-9]+)*$` and is at most
//!   `MAX_SLUG_CHARS` long.
//! - `slugify` output always satisfies `is_valid_slug`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum slug length accepted by storage.
pub const MAX_SLUG_CHARS: usize = 120;
/// Maximum Instagram handle length.
pub const MAX_HANDLE_CHARS: usize = 30;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9._]{1,30}$").expect("valid handle regex"));

/// Errors produced while deriving a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Input was empty after trimming.
    Empty,
    /// Input had no letter or digit to keep.
    NoAlphanumeric(String),
}

impl Display for SlugError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "slug source text cannot be empty"),
            Self::NoAlphanumeric(value) => {
                write!(f, "`{value}` must contain at least one letter or number")
            }
        }
    }
}

impl Error for SlugError {}

/// Derives a slug from free-form text.
///
/// `"Show de Rock: Edição 2"` becomes `"show-de-rock-edicao-2"`.
pub fn slugify(text: &str) -> Result<String, SlugError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SlugError::Empty);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut prev_was_dash = false;

    for ch in fold_diacritics(trimmed).chars() {
        let normalized = match ch {
            'a'..='z' | '0'..='9' => Some(ch),
            'A'..='Z' => Some(ch.to_ascii_lowercase()),
            _ if ch.is_whitespace() || ch == '_' || ch == '-' => Some('-'),
            _ => None,
        };

        match normalized {
            Some('-') => {
                if out.is_empty() || prev_was_dash {
                    continue;
                }
                out.push('-');
                prev_was_dash = true;
            }
            Some(c) => {
                out.push(c);
                prev_was_dash = false;
            }
            None => {}
        }
    }

    if out.len() > MAX_SLUG_CHARS {
        out.truncate(MAX_SLUG_CHARS);
    }
    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        return Err(SlugError::NoAlphanumeric(trimmed.to_string()));
    }

    Ok(out)
}

/// Returns whether `value` is already a canonical slug.
pub fn is_valid_slug(value: &str) -> bool {
    value.len() <= MAX_SLUG_CHARS && SLUG_RE.is_match(value)
}

/// Builds the `n`-th numbered variant of a slug (`base-n`).
///
/// `n <= 1` returns the base unchanged. The base is shortened so the variant
/// still fits in `MAX_SLUG_CHARS`.
pub fn next_slug_variant(base: &str, n: u32) -> String {
    if n <= 1 {
        return base.to_string();
    }

    let suffix = format!("-{n}");
    let keep = MAX_SLUG_CHARS.saturating_sub(suffix.len());
    let mut stem = base.chars().take(keep).collect::<String>();
    while stem.ends_with('-') {
        stem.pop();
    }
    format!("{stem}{suffix}")
}

/// Normalizes an Instagram handle: trims, strips a leading `@`, lowercases.
///
/// Returns `None` for blank input.
pub fn normalize_handle(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.to_lowercase())
}

/// Returns whether `value` is a canonical (already normalized) handle.
pub fn is_valid_handle(value: &str) -> bool {
    HANDLE_RE.is_match(value)
}

/// Lowercases and strips Latin diacritics, for accent-insensitive matching.
pub fn fold_for_search(value: &str) -> String {
    fold_diacritics(value.trim()).to_lowercase()
}

fn fold_diacritics(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match fold_char(ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

fn fold_char(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => "O",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        _ => return None,
    };
    Some(folded)
}
