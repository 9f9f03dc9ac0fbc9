//! Runtime configuration for catalog tools.
//!
//! # Responsibility
//! - Load `agenda.toml` (or defaults) into typed settings.
//! - Validate values once, before any subsystem starts.
//!
//! # Invariants
//! - Every field has a default, so an empty file is a valid config.
//! - Durations are strictly positive; `log_dir` is absolute when set.

use crate::probe::machine::{ProbeConfig, DEFAULT_DEBOUNCE, DEFAULT_LOOKUP_TIMEOUT};
use crate::search::directory::{DEFAULT_LIMIT, MAX_LIMIT};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file for binaries.
pub const CONFIG_ENV_VAR: &str = "AGENDA_CONFIG";

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Root configuration structure for `agenda.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Rolling log directory; logging stays off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            log_dir: None,
            probe: ProbeSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

/// Uniqueness probe timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl ProbeSettings {
    pub fn to_probe_config(self) -> ProbeConfig {
        ProbeConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
        }
    }
}

/// Directory search defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_limit")]
    pub default_limit: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

impl AgendaConfig {
    /// Parses and validates config text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Loads from `explicit`, else from `$AGENDA_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.probe.debounce_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe.debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.probe.lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe.lookup_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.search.default_limit == 0 || self.search.default_limit > MAX_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "search.default_limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("agenda.sqlite3")
}

fn default_log_level() -> String {
    crate::logging::default_log_level().to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_lookup_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT.as_millis() as u64
}

fn default_search_limit() -> u32 {
    DEFAULT_LIMIT
}
