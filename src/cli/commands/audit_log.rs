use chrono::Utc;

use super::{parse_window, print_stream, write_checkpointed, CheckpointRun};
use crate::audit_log::{self, AuditLogQuery};
use crate::cli::args::{AuditLogCommands, AuditLogSearchArgs};
use crate::cli::output::RecordWriter;
use crate::client::IncydrClient;
use crate::error::Result;

pub async fn handle_audit_log_command(command: AuditLogCommands, client: &IncydrClient) -> Result<()> {
    match command {
        AuditLogCommands::Search(args) => search(args, client).await,
    }
}

async fn search(args: AuditLogSearchArgs, client: &IncydrClient) -> Result<()> {
    let (mut start, end) = parse_window(&args.window)?;
    let run = match &args.window.checkpoint {
        Some(name) => Some(CheckpointRun::open("audit-log", name, &mut start)?),
        None => None,
    };

    // The audit log only takes absolute bounds.
    let now = Utc::now();
    let start = start.map(|d| d.to_absolute(now)).transpose()?;
    let end = end.map(|d| d.to_absolute(now)).transpose()?;
    let query = AuditLogQuery {
        event_types: args.event_type,
        actor_ids: args.actor_id,
        actor_names: args.actor_name,
        actor_ip_addresses: args.actor_ip,
        affected_user_ids: args.affected_user_id,
        affected_user_names: args.affected_username,
        ..AuditLogQuery::between(start, end)
    };

    if args.count {
        println!("{}", audit_log::result_count(client, &query).await?);
        return Ok(());
    }

    let written = match run {
        Some(run) => {
            let writer = RecordWriter::stdout(&args.output);
            write_checkpointed(audit_log::iter_all(client, query), writer, run).await?
        }
        None => print_stream(audit_log::iter_all(client, query), &args.output).await?,
    };
    tracing::info!(written, "audit log search complete");
    Ok(())
}
