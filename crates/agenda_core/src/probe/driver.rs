//! Tokio driver for `ProbeMachine`.
//!
//! # Responsibility
//! - Own one machine per probed field and feed it input, timer and lookup
//!   events from a single task (one writer per field).
//! - Run issued lookups concurrently and publish snapshots on a `watch`
//!   channel for status consumers.
//!
//! # Invariants
//! - Outstanding lookups are aborted when the probe is disposed or dropped;
//!   their results can never reach a disposed machine.
//! - Snapshots are published only when they change.

use crate::probe::lookup::UniquenessLookup;
use crate::probe::machine::{ProbeConfig, ProbeEffect, ProbeEvent, ProbeMachine, ProbeTarget};
use crate::probe::status::ProbeSnapshot;
use log::{debug, error};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

#[derive(Debug)]
enum ProbeCommand {
    Input(String),
    Dispose,
}

/// Handle to a running uniqueness probe for one form field.
///
/// Must be created inside a tokio runtime. Dropping the handle disposes the
/// probe.
pub struct SlugProbe {
    commands: mpsc::UnboundedSender<ProbeCommand>,
    snapshots: watch::Receiver<ProbeSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl SlugProbe {
    /// Spawns the probe task for `target` using the injected `lookup`.
    pub fn spawn(
        lookup: Arc<dyn UniquenessLookup>,
        target: ProbeTarget,
        config: ProbeConfig,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(ProbeSnapshot::default());
        let machine = ProbeMachine::new(target, config);

        let task = tokio::spawn(run_probe(machine, lookup, command_rx, snapshot_tx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }

    /// Reports the field's current raw value (one call per keystroke).
    pub fn input(&self, value: impl Into<String>) {
        // A closed channel means the task already stopped; nothing to update.
        let _ = self.commands.send(ProbeCommand::Input(value.into()));
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ProbeSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<ProbeSnapshot> {
        self.snapshots.clone()
    }

    /// Stops the probe and waits for its task to finish.
    pub async fn dispose(mut self) {
        let _ = self.commands.send(ProbeCommand::Dispose);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!("event=probe_dispose module=probe status=error error={err}");
            }
        }
    }
}

impl Drop for SlugProbe {
    fn drop(&mut self) {
        let _ = self.commands.send(ProbeCommand::Dispose);
    }
}

async fn run_probe(
    mut machine: ProbeMachine,
    lookup: Arc<dyn UniquenessLookup>,
    mut commands: mpsc::UnboundedReceiver<ProbeCommand>,
    snapshots: watch::Sender<ProbeSnapshot>,
) {
    let mut lookups: JoinSet<ProbeEvent> = JoinSet::new();

    loop {
        let deadline = machine.next_deadline();

        let event = tokio::select! {
            command = commands.recv() => match command {
                Some(ProbeCommand::Input(value)) => ProbeEvent::InputChanged { value, at: now() },
                Some(ProbeCommand::Dispose) | None => ProbeEvent::ComponentDisposed,
            },
            joined = lookups.join_next(), if !lookups.is_empty() => match joined {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    // The machine's lookup deadline still bounds this field.
                    error!("event=probe_lookup module=probe status=error error_code=task_failed error={err}");
                    continue;
                }
                None => continue,
            },
            () = sleep_until(deadline) => ProbeEvent::TimerFired { at: now() },
        };

        let disposing = event == ProbeEvent::ComponentDisposed;
        if let ProbeEffect::IssueLookup { seq, request } = machine.handle(event) {
            let lookup = Arc::clone(&lookup);
            lookups.spawn(async move {
                match lookup.count_matches(&request).await {
                    Ok(matches) => ProbeEvent::LookupResolved { seq, matches },
                    Err(error) => ProbeEvent::LookupFailed { seq, error },
                }
            });
        }

        let next = machine.snapshot();
        snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });

        if disposing {
            lookups.abort_all();
            debug!("event=probe_dispose module=probe status=ok last_seq={}", machine.last_seq());
            break;
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
