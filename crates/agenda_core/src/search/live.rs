//! Debounced type-ahead search session.
//!
//! Picker fields (city, venue, organizer) search while the user types. The
//! session debounces the text, tags each issued query with a sequence number
//! and keeps only results for the latest query.

use crate::probe::debounce::Debouncer;
use crate::search::directory::DirectoryHit;
use std::time::{Duration, Instant};

/// Queries shorter than this (after trimming) clear results instead of searching.
pub const MIN_QUERY_CHARS: usize = 2;

/// A query the caller must execute, then report back via `complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub text: String,
}

/// Type-ahead session state for one picker field.
#[derive(Debug, Clone)]
pub struct LiveSearch {
    debouncer: Debouncer<String>,
    last_seq: u64,
    pending_seq: Option<u64>,
    results: Vec<DirectoryHit>,
}

impl LiveSearch {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(debounce),
            last_seq: 0,
            pending_seq: None,
            results: Vec::new(),
        }
    }

    /// Records the field's raw text at `at`.
    ///
    /// Short input clears results and invalidates any in-flight query.
    pub fn input(&mut self, text: &str, at: Instant) {
        let trimmed = text.trim();
        self.pending_seq = None;
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            self.debouncer.cancel();
            self.results.clear();
            return;
        }
        self.debouncer.push(trimmed.to_string(), at);
    }

    /// Returns a ticket once the text has been stable for the debounce window.
    pub fn poll(&mut self, at: Instant) -> Option<SearchTicket> {
        let text = self.debouncer.poll(at)?;
        self.last_seq += 1;
        self.pending_seq = Some(self.last_seq);
        Some(SearchTicket {
            seq: self.last_seq,
            text,
        })
    }

    /// Next instant at which `poll` may yield a ticket.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Stores `hits` if `seq` is the latest outstanding query.
    ///
    /// Returns `false` (and drops the hits) for stale or cancelled queries.
    pub fn complete(&mut self, seq: u64, hits: Vec<DirectoryHit>) -> bool {
        if self.pending_seq != Some(seq) {
            return false;
        }
        self.pending_seq = None;
        self.results = hits;
        true
    }

    /// Marks the latest query as failed, keeping the previous results.
    pub fn fail(&mut self, seq: u64) -> bool {
        if self.pending_seq != Some(seq) {
            return false;
        }
        self.pending_seq = None;
        true
    }

    pub fn is_searching(&self) -> bool {
        self.pending_seq.is_some()
    }

    pub fn results(&self) -> &[DirectoryHit] {
        &self.results
    }
}
