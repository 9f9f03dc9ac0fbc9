//! Core catalog logic for the Agenda cultural-events platform.
//! This crate owns records, persistence, uniqueness probing and directory search.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod probe;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{AgendaConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::RecordId;
pub use probe::driver::SlugProbe;
pub use probe::lookup::{
    probe_once, Collection, LookupError, LookupField, LookupRequest, UniquenessLookup,
};
pub use probe::machine::{ProbeConfig, ProbeMachine, ProbeTarget};
pub use probe::status::{ProbeSnapshot, ProbeStatus};
pub use repo::lookup_repo::SqliteUniquenessLookup;
pub use repo::{RepoError, RepoResult};
pub use search::directory::{search_directory, DirectoryHit, DirectoryKind, DirectoryQuery};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
