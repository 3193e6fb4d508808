use super::{parse_window, print_one, print_stream, write_checkpointed, CheckpointRun};
use crate::alerts;
use crate::cli::args::{AlertSearchArgs, AlertsCommands};
use crate::cli::output::RecordWriter;
use crate::client::IncydrClient;
use crate::error::Result;
use crate::queries::alert_query::{ALERT_CREATED_TERM, MAX_ALERT_PAGE_SIZE};
use crate::queries::{AlertQuery, FilterBuilder, FilterGroup, SortDirection};

pub async fn handle_alerts_command(command: AlertsCommands, client: &IncydrClient) -> Result<()> {
    match command {
        AlertsCommands::Search(args) => search(args, client).await,
        AlertsCommands::Show { alert_id, output } => {
            let details = alerts::get_alert(client, &alert_id).await?;
            print_one(&details, &output)
        }
        AlertsCommands::Update {
            alert_ids,
            state,
            note,
        } => {
            alerts::change_state(client, &alert_ids, state, note.as_deref()).await?;
            eprintln!("Updated {} alert(s) to {}", alert_ids.len(), state.as_str());
            Ok(())
        }
        AlertsCommands::AddNote { alert_id, note } => {
            alerts::add_note(client, &alert_id, &note).await?;
            eprintln!("Added note to alert {alert_id}");
            Ok(())
        }
    }
}

async fn search(args: AlertSearchArgs, client: &IncydrClient) -> Result<()> {
    let (mut start, end) = parse_window(&args.window)?;
    let run = match &args.window.checkpoint {
        Some(name) => Some(CheckpointRun::open("alerts", name, &mut start)?),
        None => None,
    };

    let mut query = AlertQuery::new();
    if let Some(group) =
        FilterGroup::for_date_range(ALERT_CREATED_TERM, start.as_ref(), end.as_ref())?
    {
        query = query.restricted_to(group);
    }
    if !args.state.is_empty() {
        let states: Vec<&str> = args.state.iter().map(|s| s.as_str()).collect();
        query = query.equals("State", states)?;
    }
    if !args.severity.is_empty() {
        query = query.equals("Severity", args.severity.clone())?;
    }
    if !args.rule_id.is_empty() {
        query = query.equals("RuleId", args.rule_id.clone())?;
    }
    if !args.actor.is_empty() {
        query = query.equals("Actor", args.actor.clone())?;
    }
    query = query.with_page_size(client.page_size().min(MAX_ALERT_PAGE_SIZE))?;

    let written = match run {
        Some(run) => {
            query = query.with_sort(ALERT_CREATED_TERM, SortDirection::Asc);
            let writer = RecordWriter::stdout(&args.output);
            write_checkpointed(alerts::iter_all(client, &query), writer, run).await?
        }
        None => print_stream(alerts::iter_all(client, &query), &args.output).await?,
    };
    tracing::info!(written, "alert search complete");
    Ok(())
}
