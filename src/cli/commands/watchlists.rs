use super::{print_list, print_one, print_stream, report_bulk};
use crate::actors::resolve_actor_id;
use crate::cli::args::{WatchlistMemberArgs, WatchlistsCommands};
use crate::cli::input::read_column;
use crate::client::IncydrClient;
use crate::error::Result;
use crate::watchlists;

/// Column holding actors in bulk input files.
const BULK_ACTOR_COLUMN: &str = "actor";

pub async fn handle_watchlists_command(
    command: WatchlistsCommands,
    client: &IncydrClient,
) -> Result<()> {
    match command {
        WatchlistsCommands::List(output) => {
            print_stream(watchlists::iter_all(client), &output).await?;
            Ok(())
        }
        WatchlistsCommands::Show { watchlist, output } => {
            let id = watchlists::resolve_watchlist_id(client, &watchlist).await?;
            print_one(&watchlists::get_watchlist(client, &id).await?, &output)
        }
        WatchlistsCommands::Create {
            watchlist_type,
            title,
            description,
        } => {
            let created = watchlists::create_watchlist(
                client,
                watchlist_type,
                title.as_deref(),
                description.as_deref(),
            )
            .await?;
            println!("{}", created.watchlist_id);
            Ok(())
        }
        WatchlistsCommands::Delete { watchlist } => {
            let id = watchlists::resolve_watchlist_id(client, &watchlist).await?;
            watchlists::delete_watchlist(client, &id).await?;
            eprintln!("Deleted watchlist {watchlist}");
            Ok(())
        }
        WatchlistsCommands::ListMembers { watchlist, output } => {
            let id = watchlists::resolve_watchlist_id(client, &watchlist).await?;
            print_list(&watchlists::list_included_actors(client, &id).await?, &output)?;
            Ok(())
        }
        WatchlistsCommands::Add(args) => {
            let (id, actors) = resolve_members(client, &args).await?;
            report_bulk("add", watchlists::add_included_actors(client, &id, &actors).await)
        }
        WatchlistsCommands::Remove(args) => {
            let (id, actors) = resolve_members(client, &args).await?;
            report_bulk(
                "remove",
                watchlists::remove_included_actors(client, &id, &actors).await,
            )
        }
    }
}

/// Resolves the watchlist and every actor named on the command line or in
/// `--file`, before any membership change is sent.
async fn resolve_members(
    client: &IncydrClient,
    args: &WatchlistMemberArgs,
) -> Result<(String, Vec<String>)> {
    let watchlist_id = watchlists::resolve_watchlist_id(client, &args.watchlist).await?;
    let mut keys = args.actors.clone();
    if let Some(path) = &args.file {
        keys.extend(read_column(path, args.file_format, BULK_ACTOR_COLUMN)?);
    }
    let mut actor_ids = Vec::with_capacity(keys.len());
    for key in &keys {
        actor_ids.push(resolve_actor_id(client, key).await?);
    }
    Ok((watchlist_id, actor_ids))
}
