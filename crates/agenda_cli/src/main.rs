//! `agenda` command-line entry point.
//!
//! # Responsibility
//! - Expose slug, uniqueness and directory tools over a catalog file.
//! - Print one JSON envelope per command; `watch` also streams snapshots.

mod output;

use agenda_core::model::slug::slugify;
use agenda_core::{
    db, probe_once, search_directory, AgendaConfig, Collection, DirectoryKind, DirectoryQuery,
    LookupField, LookupRequest, ProbeSnapshot, ProbeStatus, ProbeTarget, SlugProbe,
    SqliteUniquenessLookup,
};
use clap::{Parser, Subcommand};
use log::info;
use output::{finish, print_line, CliError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "agenda")]
#[command(version = agenda_core::core_version())]
#[command(about = "Catalog tools for the Agenda events platform")]
struct Cli {
    /// Config file; falls back to $AGENDA_CONFIG, then built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core version
    Version,
    /// Convert free text into a canonical slug
    Slugify { text: String },
    /// Run one uniqueness lookup against the catalog
    Check {
        #[arg(long)]
        collection: String,
        #[arg(long, default_value = "slug")]
        field: String,
        #[arg(long)]
        value: String,
        /// ID of the record being edited
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Probe stdin lines as keystrokes and stream status snapshots
    Watch {
        #[arg(long)]
        collection: String,
        #[arg(long, default_value = "slug")]
        field: String,
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Search cities, venues, artists and organizers by name
    Search {
        text: String,
        /// city | venue | artist | organizer
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Slugify { .. } => "slugify",
            Self::Check { .. } => "check",
            Self::Watch { .. } => "watch",
            Self::Search { .. } => "search",
        }
    }
}

#[derive(Debug, Serialize)]
struct VersionOutput {
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct SlugOutput {
    input: String,
    slug: String,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    collection: Collection,
    field: LookupField,
    candidate: String,
    status: ProbeStatus,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => return finish::<()>(Err(err)),
    };

    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );
    match cli.command {
        Commands::Version => finish(Ok(VersionOutput {
            version: agenda_core::core_version(),
        })),
        Commands::Slugify { text } => finish(run_slugify(text)),
        Commands::Check {
            collection,
            field,
            value,
            exclude,
        } => finish(run_check(&config, &collection, &field, &value, exclude.as_deref()).await),
        Commands::Watch {
            collection,
            field,
            exclude,
        } => finish(run_watch(&config, &collection, &field, exclude).await),
        Commands::Search { text, kind, limit } => {
            finish(run_search(&config, text, kind.as_deref(), limit))
        }
    }
}

fn load_config(cli: &Cli) -> Result<AgendaConfig, CliError> {
    let config = AgendaConfig::resolve(cli.config.as_deref())
        .map_err(|err| CliError::new("config_invalid", err))?;
    agenda_core::init_from_config(&config).map_err(|err| CliError::new("logging_failed", err))?;
    Ok(config)
}

fn run_slugify(text: String) -> Result<SlugOutput, CliError> {
    let slug = slugify(&text).map_err(|err| CliError::new("invalid_argument", err))?;
    Ok(SlugOutput { input: text, slug })
}

fn parse_target(collection: &str, field: &str) -> Result<(Collection, LookupField), CliError> {
    let collection = collection
        .parse::<Collection>()
        .map_err(|err| CliError::new("invalid_argument", err))?;
    let field = field
        .parse::<LookupField>()
        .map_err(|err| CliError::new("invalid_argument", err))?;
    Ok((collection, field))
}

fn open_lookup(config: &AgendaConfig) -> Result<Arc<SqliteUniquenessLookup>, CliError> {
    let conn = db::open_shared_db(&config.db_path).map_err(|err| CliError::new("db_open", err))?;
    Ok(Arc::new(SqliteUniquenessLookup::new(conn)))
}

async fn run_check(
    config: &AgendaConfig,
    collection: &str,
    field: &str,
    value: &str,
    exclude: Option<&str>,
) -> Result<CheckOutput, CliError> {
    let (collection, field) = parse_target(collection, field)?;
    let lookup = open_lookup(config)?;
    let request = LookupRequest::new(collection, field, value, exclude);
    let timeout = config.probe.to_probe_config().lookup_timeout;
    let status = probe_once(lookup.as_ref(), &request, timeout).await;

    Ok(CheckOutput {
        collection,
        field,
        candidate: request.candidate,
        status,
    })
}

async fn run_watch(
    config: &AgendaConfig,
    collection: &str,
    field: &str,
    exclude: Option<String>,
) -> Result<ProbeSnapshot, CliError> {
    let (collection, field) = parse_target(collection, field)?;
    let lookup = open_lookup(config)?;
    let probe_config = config.probe.to_probe_config();

    let mut target = ProbeTarget::new(collection, field);
    if let Some(id) = exclude {
        target = target.excluding(id);
    }
    let probe = SlugProbe::spawn(lookup, target, probe_config);
    let mut snapshots = probe.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_input: Option<String> = None;
    let mut awaiting_change = false;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    last_input = Some(line.trim().to_string()).filter(|value| !value.is_empty());
                    awaiting_change = awaits_fresh_snapshot(&snapshots.borrow(), last_input.as_deref());
                    probe.input(line);
                }
                Ok(None) => break,
                Err(err) => return Err(CliError::new("internal_io", err)),
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                awaiting_change = false;
                let snapshot = snapshots.borrow_and_update().clone();
                print_line(&snapshot)?;
            }
        }
    }

    // Stdin closed: let the last value settle, bounded by one debounce plus one lookup.
    let settle = tokio::time::sleep(probe_config.debounce + probe_config.lookup_timeout);
    tokio::pin!(settle);
    loop {
        let current = snapshots.borrow().clone();
        if !awaiting_change && is_settled(&current, last_input.as_deref()) {
            break;
        }
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                awaiting_change = false;
                let snapshot = snapshots.borrow_and_update().clone();
                print_line(&snapshot)?;
            }
            () = &mut settle => break,
        }
    }

    let last = probe.snapshot();
    probe.dispose().await;
    Ok(last)
}

/// True once the snapshot describes `last_input` with a final verdict.
///
/// A failed lookup also reads as `Unknown`, so that case waits for the
/// settle timer instead.
fn is_settled(snapshot: &ProbeSnapshot, last_input: Option<&str>) -> bool {
    match last_input {
        None => snapshot.candidate.is_none(),
        Some(input) => {
            snapshot.candidate.as_deref() == Some(input)
                && !snapshot.is_checking
                && snapshot.status != ProbeStatus::Unknown
        }
    }
}

/// True when the snapshot already looks settled for a line the probe task
/// has not consumed yet, e.g. the same candidate sent twice.
///
/// Re-entering a resolved candidate always publishes a debouncing snapshot,
/// so the wait ends on the next change. Blank input needs no wait: idle is
/// final.
fn awaits_fresh_snapshot(snapshot: &ProbeSnapshot, last_input: Option<&str>) -> bool {
    last_input.is_some() && is_settled(snapshot, last_input)
}

fn run_search(
    config: &AgendaConfig,
    text: String,
    kind: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<agenda_core::DirectoryHit>, CliError> {
    let mut query = DirectoryQuery::new(text).with_limit(limit.unwrap_or(config.search.default_limit));
    if let Some(kind) = kind {
        let kind = DirectoryKind::parse(kind.trim()).ok_or_else(|| {
            CliError::new("invalid_argument", format!("unknown directory kind `{kind}`"))
        })?;
        query = query.with_kind(kind);
    }

    let conn = db::open_db(&config.db_path).map_err(|err| CliError::new("db_open", err))?;
    search_directory(&conn, &query).map_err(|err| CliError::new("search_failed", err))
}
