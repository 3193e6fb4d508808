use super::{print_list, print_one};
use crate::actors;
use crate::cli::args::ActorsCommands;
use crate::client::IncydrClient;
use crate::error::Result;

pub async fn handle_actors_command(command: ActorsCommands, client: &IncydrClient) -> Result<()> {
    match command {
        ActorsCommands::Show { actor, output } => {
            let actor = if actor.contains('@') {
                actors::get_actor_by_name(client, &actor).await?
            } else {
                actors::get_actor_by_id(client, &actor).await?
            };
            print_one(&actor, &output)
        }
        ActorsCommands::Search { prefix, output } => {
            let found = actors::search_actors(client, &prefix, client.page_size()).await?;
            print_list(&found, &output)?;
            Ok(())
        }
    }
}
