//! Typed catalog records for the listing platform.
//!
//! # Responsibility
//! - Define canonical records for events, agents, venues and cities.
//! - Validate field formats once, at the record boundary.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Deletion is a soft-delete tombstone; slugs stay reserved while deleted.

pub mod agent;
pub mod event;
pub mod slug;
pub mod validation;
pub mod venue;

/// Stable identifier for every catalog record.
pub type RecordId = uuid::Uuid;
