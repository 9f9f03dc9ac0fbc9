//! Directory search entry points.
//!
//! # Responsibility
//! - Expose name search over cities, venues and agents for form pickers.
//! - Provide a debounced, stale-safe type-ahead session on top of it.

pub mod directory;
pub mod live;
