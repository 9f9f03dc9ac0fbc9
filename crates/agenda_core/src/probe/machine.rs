//! Debounced uniqueness probe state machine.
//!
//! # Responsibility
//! - Turn discrete UI events into at most one lookup per quiet window.
//! - Decide which lookup outcomes may update the visible status.
//!
//! # Invariants
//! - Every issued lookup gets a strictly increasing sequence number.
//! - A lookup outcome is applied only while the machine is `Checking` the
//!   same sequence number; anything else is stale and dropped. This gives
//!   issue-order application and logical cancellation on new input/dispose.
//! - `Checking` always carries a deadline; reaching it resolves to `Failed`
//!   (status `Unknown`), so `is_checking` never sticks.
//! - After `ComponentDisposed` every event is ignored.
//! - The machine never reads the clock or performs I/O; drivers supply time
//!   and execute `ProbeEffect`s.

use crate::probe::debounce::Debouncer;
use crate::probe::lookup::{classify, Collection, LookupError, LookupField, LookupRequest};
use crate::probe::status::{ProbeSnapshot, ProbeStatus};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Default quiet window before a lookup is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Default bound on a single lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Timing knobs for one probed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub debounce: Duration,
    pub lookup_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// The fixed part of every lookup issued for one field instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub collection: Collection,
    pub field: LookupField,
    /// Id of the record being edited, if any.
    pub exclude_id: Option<String>,
}

impl ProbeTarget {
    pub fn new(collection: Collection, field: LookupField) -> Self {
        Self {
            collection,
            field,
            exclude_id: None,
        }
    }

    /// Targets an existing record so it never conflicts with itself.
    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    pub fn request(&self, candidate: &str) -> LookupRequest {
        LookupRequest::new(
            self.collection,
            self.field,
            candidate,
            self.exclude_id.as_deref(),
        )
    }
}

/// Observable machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Debouncing {
        candidate: String,
    },
    Checking {
        seq: u64,
        candidate: String,
        deadline: Instant,
    },
    Resolved {
        candidate: String,
        status: ProbeStatus,
    },
    Failed {
        candidate: String,
    },
    Disposed,
}

/// Discrete inputs driving the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    InputChanged { value: String, at: Instant },
    TimerFired { at: Instant },
    LookupResolved { seq: u64, matches: u64 },
    LookupFailed { seq: u64, error: LookupError },
    ComponentDisposed,
}

/// Work the driver must perform after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEffect {
    None,
    IssueLookup { seq: u64, request: LookupRequest },
}

/// Explicit state machine for one probed field.
#[derive(Debug, Clone)]
pub struct ProbeMachine {
    target: ProbeTarget,
    lookup_timeout: Duration,
    debouncer: Debouncer<String>,
    state: ProbeState,
    last_seq: u64,
}

impl ProbeMachine {
    pub fn new(target: ProbeTarget, config: ProbeConfig) -> Self {
        Self {
            target,
            lookup_timeout: config.lookup_timeout,
            debouncer: Debouncer::new(config.debounce),
            state: ProbeState::Idle,
            last_seq: 0,
        }
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    /// Sequence number of the most recently issued lookup (0 when none).
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Next instant at which the driver must deliver `TimerFired`.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            ProbeState::Debouncing { .. } => self.debouncer.deadline(),
            ProbeState::Checking { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Status-consumer view of the current state.
    pub fn snapshot(&self) -> ProbeSnapshot {
        match &self.state {
            ProbeState::Idle | ProbeState::Disposed => ProbeSnapshot::default(),
            ProbeState::Debouncing { candidate } | ProbeState::Failed { candidate } => {
                ProbeSnapshot {
                    status: ProbeStatus::Unknown,
                    is_checking: false,
                    candidate: Some(candidate.clone()),
                }
            }
            ProbeState::Checking { candidate, .. } => ProbeSnapshot {
                status: ProbeStatus::Unknown,
                is_checking: true,
                candidate: Some(candidate.clone()),
            },
            ProbeState::Resolved { candidate, status } => ProbeSnapshot {
                status: *status,
                is_checking: false,
                candidate: Some(candidate.clone()),
            },
        }
    }

    /// Applies one event and returns the effect the driver must run.
    pub fn handle(&mut self, event: ProbeEvent) -> ProbeEffect {
        if self.state == ProbeState::Disposed {
            return ProbeEffect::None;
        }

        match event {
            ProbeEvent::InputChanged { value, at } => {
                self.on_input(&value, at);
                ProbeEffect::None
            }
            ProbeEvent::TimerFired { at } => self.on_timer(at),
            ProbeEvent::LookupResolved { seq, matches } => {
                self.on_resolved(seq, matches);
                ProbeEffect::None
            }
            ProbeEvent::LookupFailed { seq, error } => {
                self.on_failed(seq, &error);
                ProbeEffect::None
            }
            ProbeEvent::ComponentDisposed => {
                self.debouncer.cancel();
                self.state = ProbeState::Disposed;
                ProbeEffect::None
            }
        }
    }

    fn on_input(&mut self, value: &str, at: Instant) {
        let candidate = value.trim();
        if candidate.is_empty() {
            self.debouncer.cancel();
            self.state = ProbeState::Idle;
            return;
        }

        self.debouncer.push(candidate.to_string(), at);
        self.state = ProbeState::Debouncing {
            candidate: candidate.to_string(),
        };
    }

    fn on_timer(&mut self, at: Instant) -> ProbeEffect {
        match &self.state {
            ProbeState::Debouncing { .. } => {
                let Some(candidate) = self.debouncer.poll(at) else {
                    return ProbeEffect::None;
                };

                self.last_seq += 1;
                let seq = self.last_seq;
                let request = self.target.request(&candidate);
                debug!(
                    "event=probe_lookup module=probe status=start collection={} field={} seq={}",
                    self.target.collection, self.target.field, seq
                );
                self.state = ProbeState::Checking {
                    seq,
                    candidate,
                    deadline: at + self.lookup_timeout,
                };
                ProbeEffect::IssueLookup { seq, request }
            }
            ProbeState::Checking {
                seq,
                candidate,
                deadline,
            } if at >= *deadline => {
                warn!(
                    "event=probe_lookup module=probe status=timeout collection={} field={} seq={} timeout_ms={}",
                    self.target.collection,
                    self.target.field,
                    seq,
                    self.lookup_timeout.as_millis()
                );
                self.state = ProbeState::Failed {
                    candidate: candidate.clone(),
                };
                ProbeEffect::None
            }
            _ => ProbeEffect::None,
        }
    }

    fn on_resolved(&mut self, seq: u64, matches: u64) {
        let ProbeState::Checking {
            seq: current,
            candidate,
            ..
        } = &self.state
        else {
            self.log_stale(seq, "resolved");
            return;
        };
        if *current != seq {
            self.log_stale(seq, "resolved");
            return;
        }

        let status = classify(matches);
        debug!(
            "event=probe_lookup module=probe status=ok collection={} field={} seq={} result={}",
            self.target.collection,
            self.target.field,
            seq,
            status.as_str()
        );
        self.state = ProbeState::Resolved {
            candidate: candidate.clone(),
            status,
        };
    }

    fn on_failed(&mut self, seq: u64, error: &LookupError) {
        let ProbeState::Checking {
            seq: current,
            candidate,
            ..
        } = &self.state
        else {
            self.log_stale(seq, "failed");
            return;
        };
        if *current != seq {
            self.log_stale(seq, "failed");
            return;
        }

        warn!(
            "event=probe_lookup module=probe status=error collection={} field={} seq={} error={}",
            self.target.collection, self.target.field, seq, error
        );
        self.state = ProbeState::Failed {
            candidate: candidate.clone(),
        };
    }

    fn log_stale(&self, seq: u64, outcome: &str) {
        debug!(
            "event=probe_lookup module=probe status=stale collection={} field={} seq={} latest_seq={} outcome={}",
            self.target.collection, self.target.field, seq, self.last_seq, outcome
        );
    }
}
