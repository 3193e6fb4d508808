use std::io::Write;

use super::{parse_window, print_list, write_checkpointed, write_stream, CheckpointRun};
use crate::checkpoint::CheckpointStore;
use crate::cli::args::{FileEventSearchArgs, FileEventsCommands};
use crate::cli::output::RecordWriter;
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::file_events;
use crate::queries::event_query::{EVENT_TIMESTAMP_TERM, MAX_EVENT_PAGE_SIZE};
use crate::queries::{EventQuery, FilterBuilder, FilterGroup, SortDirection};

pub async fn handle_file_events_command(
    command: FileEventsCommands,
    client: &IncydrClient,
) -> Result<()> {
    match command {
        FileEventsCommands::Search(args) => {
            let checkpoints = match &args.window.checkpoint {
                Some(_) => Some(CheckpointStore::open_default("file-events")?),
                None => None,
            };
            let writer = RecordWriter::stdout(&args.output);
            let written = search(args, client, checkpoints, writer).await?;
            tracing::info!(written, "file event search complete");
            Ok(())
        }
        FileEventsCommands::SavedSearches(output) => {
            let searches = file_events::list_saved_searches(client).await?;
            print_list(&searches, &output)?;
            Ok(())
        }
    }
}

/// Runs a search into `writer`. `checkpoints` is the store that holds the
/// `--checkpoint` name, when one is given.
async fn search<W: Write>(
    args: FileEventSearchArgs,
    client: &IncydrClient,
    checkpoints: Option<CheckpointStore>,
    writer: RecordWriter<W>,
) -> Result<usize> {
    let (mut start, end) = parse_window(&args.window)?;
    let run = match (&args.window.checkpoint, checkpoints) {
        (Some(name), Some(store)) => Some(CheckpointRun::open_in(store, name, &mut start)?),
        _ => None,
    };

    let query = match (&args.advanced_query, &args.saved_search) {
        (Some(raw), _) => parse_advanced_query(raw)?,
        (None, Some(id)) => {
            EventQuery::from_saved_search(&file_events::get_saved_search(client, id).await?)
        }
        (None, None) => EventQuery::new(),
    };
    let mut query = apply_filters(query, &args)?;
    if let Some(group) =
        FilterGroup::for_date_range(EVENT_TIMESTAMP_TERM, start.as_ref(), end.as_ref())?
    {
        query = query.restricted_to(group);
    }
    query = query.with_page_size(client.page_size().min(MAX_EVENT_PAGE_SIZE))?;

    match run {
        Some(run) => {
            // Resuming requires records in timestamp order.
            query = query.with_sort(EVENT_TIMESTAMP_TERM, SortDirection::Asc);
            write_checkpointed(file_events::iter_all(client, &query), writer, run).await
        }
        None => write_stream(file_events::iter_all(client, &query), writer).await,
    }
}

/// Parses `--advanced-query`: inline JSON, or `@path` to read it from a file.
fn parse_advanced_query(raw: &str) -> Result<EventQuery> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text)
        .map_err(|e| IncydrError::Validation(format!("advanced query is not a valid query: {e}")))
}

/// Splits `TERM=VALUE`.
fn split_term(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((term, value)) if !term.trim().is_empty() && !value.is_empty() => {
            Ok((term.trim(), value))
        }
        _ => Err(IncydrError::Validation(format!(
            "expected TERM=VALUE, got '{pair}'"
        ))),
    }
}

/// Groups repeated `TERM=VALUE` pairs by term, keeping first-seen order.
fn group_by_term(pairs: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for pair in pairs {
        let (term, value) = split_term(pair)?;
        match grouped.iter_mut().find(|(t, _)| t == term) {
            Some((_, values)) => values.push(value.to_string()),
            None => grouped.push((term.to_string(), vec![value.to_string()])),
        }
    }
    Ok(grouped)
}

fn apply_filters(mut query: EventQuery, args: &FileEventSearchArgs) -> Result<EventQuery> {
    for (term, values) in group_by_term(&args.equals)? {
        query = query.equals(&term, values)?;
    }
    for (term, values) in group_by_term(&args.not_equals)? {
        query = query.not_equals(&term, values)?;
    }
    for term in &args.exists {
        query = query.exists(term);
    }
    for term in &args.does_not_exist {
        query = query.does_not_exist(term);
    }
    if args.match_any {
        query = query.matches_any();
    }
    Ok(query)
}
