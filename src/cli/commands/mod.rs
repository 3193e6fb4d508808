mod actors;
mod agents;
mod alerts;
mod audit_log;
mod cases;
mod devices;
mod file_events;
mod legal_hold;
mod orgs;
mod risk_profiles;
mod sessions;
mod trusted_activities;
mod users;
mod watchlists;

pub use actors::handle_actors_command;
pub use agents::handle_agents_command;
pub use alerts::handle_alerts_command;
pub use audit_log::handle_audit_log_command;
pub use cases::handle_cases_command;
pub use devices::handle_devices_command;
pub use file_events::handle_file_events_command;
pub use legal_hold::handle_legal_hold_command;
pub use orgs::handle_orgs_command;
pub use risk_profiles::handle_risk_profiles_command;
pub use sessions::handle_sessions_command;
pub use trusted_activities::handle_trusted_activities_command;
pub use users::handle_users_command;
pub use watchlists::handle_watchlists_command;

use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::io::Write;

use super::args::{Commands, SearchWindowArgs};
use super::output::{OutputArgs, RecordWriter};
use crate::bulk::BulkOutcome;
use crate::checkpoint::{Checkpoint, CheckpointStore, CheckpointTracker, Checkpointed};
use crate::client::IncydrClient;
use crate::dates::DateInput;
use crate::error::{IncydrError, Result};

pub async fn handle_command(command: Commands, client: &IncydrClient) -> Result<()> {
    match command {
        Commands::FileEvents(cmd) => handle_file_events_command(cmd, client).await,
        Commands::Alerts(cmd) => handle_alerts_command(cmd, client).await,
        Commands::Cases(cmd) => handle_cases_command(cmd, client).await,
        Commands::Users(cmd) => handle_users_command(cmd, client).await,
        Commands::Devices(cmd) => handle_devices_command(cmd, client).await,
        Commands::Watchlists(cmd) => handle_watchlists_command(cmd, client).await,
        Commands::Actors(cmd) => handle_actors_command(cmd, client).await,
        Commands::Agents(cmd) => handle_agents_command(cmd, client).await,
        Commands::Orgs(cmd) => handle_orgs_command(cmd, client).await,
        Commands::LegalHold(cmd) => handle_legal_hold_command(cmd, client).await,
        Commands::Sessions(cmd) => handle_sessions_command(cmd, client).await,
        Commands::RiskProfiles(cmd) => handle_risk_profiles_command(cmd, client).await,
        Commands::AuditLog(cmd) => handle_audit_log_command(cmd, client).await,
        Commands::TrustedActivities(cmd) => handle_trusted_activities_command(cmd, client).await,
    }
}

/// Writes every record of `records` to stdout and returns how many were
/// written.
pub(crate) async fn print_stream<T, S>(records: S, output: &OutputArgs) -> Result<usize>
where
    T: Serialize,
    S: Stream<Item = Result<T>>,
{
    write_stream(records, RecordWriter::stdout(output)).await
}

pub(crate) async fn write_stream<T, S, W>(records: S, mut writer: RecordWriter<W>) -> Result<usize>
where
    T: Serialize,
    S: Stream<Item = Result<T>>,
    W: Write,
{
    futures::pin_mut!(records);
    while let Some(record) = records.try_next().await? {
        writer.write(&record)?;
    }
    writer.finish()
}

pub(crate) fn print_list<T: Serialize>(records: &[T], output: &OutputArgs) -> Result<usize> {
    let mut writer = RecordWriter::stdout(output);
    for record in records {
        writer.write(record)?;
    }
    writer.finish()
}

pub(crate) fn print_one<T: Serialize>(record: &T, output: &OutputArgs) -> Result<()> {
    RecordWriter::stdout(output).write_one(record)
}

/// Prints a bulk summary to stderr. Any failed item makes the command fail
/// after every item has been attempted.
pub(crate) fn report_bulk(action: &str, outcome: BulkOutcome) -> Result<()> {
    for (id, err) in &outcome.failures {
        eprintln!("{action} failed for {id}: {err}");
    }
    let total = outcome.succeeded.len() + outcome.failures.len();
    eprintln!("{action}: {} of {total} succeeded", outcome.succeeded.len());
    if outcome.is_success() {
        Ok(())
    } else {
        Err(IncydrError::BulkFailed {
            failed: outcome.failures.len(),
            total,
        })
    }
}

/// Start and end bounds of a search window, before any checkpoint.
pub(crate) fn parse_window(window: &SearchWindowArgs) -> Result<(Option<DateInput>, Option<DateInput>)> {
    let start = window
        .start
        .as_deref()
        .map(DateInput::parse_with_shorthand)
        .transpose()?;
    let end = window.end.as_deref().map(DateInput::parse).transpose()?;
    Ok((start, end))
}

/// A named checkpoint being resumed and updated by one search run.
pub(crate) struct CheckpointRun {
    store: CheckpointStore,
    name: String,
    tracker: CheckpointTracker,
}

impl CheckpointRun {
    /// Opens the default store for `kind`. The stored position, when any,
    /// replaces `start`.
    pub(crate) fn open(kind: &str, name: &str, start: &mut Option<DateInput>) -> Result<Self> {
        Self::open_in(CheckpointStore::open_default(kind)?, name, start)
    }

    pub(crate) fn open_in(
        store: CheckpointStore,
        name: &str,
        start: &mut Option<DateInput>,
    ) -> Result<Self> {
        let previous: Option<Checkpoint> = store.get(name).cloned();
        if let Some(checkpoint) = &previous {
            tracing::info!(
                checkpoint = name,
                timestamp = %checkpoint.timestamp,
                "resuming from checkpoint"
            );
            *start = Some(checkpoint.start());
        }
        Ok(CheckpointRun {
            store,
            name: name.to_string(),
            tracker: CheckpointTracker::new(previous),
        })
    }

    /// Stores the position reached by this run.
    pub(crate) fn save(self) -> Result<()> {
        let CheckpointRun {
            mut store,
            name,
            tracker,
        } = self;
        match tracker.finish() {
            Some(checkpoint) => store.set(&name, checkpoint),
            None => Ok(()),
        }
    }
}

/// Like [`write_stream`], skipping records already emitted under the
/// checkpoint and saving the new position once the stream is exhausted.
pub(crate) async fn write_checkpointed<T, S, W>(
    records: S,
    mut writer: RecordWriter<W>,
    mut run: CheckpointRun,
) -> Result<usize>
where
    T: Serialize + Checkpointed,
    S: Stream<Item = Result<T>>,
    W: Write,
{
    futures::pin_mut!(records);
    let mut skipped = 0usize;
    while let Some(record) = records.try_next().await? {
        if run.tracker.admit(&record) {
            writer.write(&record)?;
        } else {
            skipped += 1;
        }
    }
    let written = writer.finish()?;
    tracing::debug!(written, skipped, "checkpointed search complete");
    run.save()?;
    Ok(written)
}
