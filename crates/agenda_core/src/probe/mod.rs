//! Debounced, stale-safe uniqueness probing for slug-like form fields.
//!
//! # Responsibility
//! - Coalesce keystrokes into one lookup per quiet window (`debounce`).
//! - Ask an injected data source whether a candidate is already taken
//!   (`lookup`), excluding the record being edited.
//! - Drive both through one explicit state machine (`machine`) so stale or
//!   late lookup results can never overwrite a newer status, and run it on
//!   tokio for live form fields (`driver`).
//!
//! Uniqueness here is advisory UX feedback; the catalog store's unique
//! constraints remain the authority at write time.

pub mod debounce;
pub mod driver;
pub mod lookup;
pub mod machine;
pub mod status;
