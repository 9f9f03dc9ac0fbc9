//! Probe status values exposed to status consumers.

use serde::Serialize;

/// Advisory uniqueness verdict for one candidate value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Not checked yet, input empty, lookup failed or superseded.
    #[default]
    Unknown,
    /// No other record holds the candidate.
    Available,
    /// At least one other record holds the candidate.
    Taken,
}

impl ProbeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::Taken => "taken",
        }
    }

    /// Whether a form may rely on this verdict to allow submission.
    ///
    /// Only `Taken` blocks; `Unknown` defers to the store's write-time check.
    pub fn blocks_submit(self) -> bool {
        self == Self::Taken
    }
}

/// What a status consumer reads for one probed field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeSnapshot {
    pub status: ProbeStatus,
    /// True only while the lookup for the current debounced value is outstanding.
    pub is_checking: bool,
    /// Latest trimmed input the status refers to; `None` when idle.
    pub candidate: Option<String>,
}
