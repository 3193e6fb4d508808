use super::{print_one, print_stream};
use crate::cli::args::TrustedActivitiesCommands;
use crate::client::IncydrClient;
use crate::error::Result;
use crate::trusted_activities;

pub async fn handle_trusted_activities_command(
    command: TrustedActivitiesCommands,
    client: &IncydrClient,
) -> Result<()> {
    match command {
        TrustedActivitiesCommands::List {
            activity_type,
            output,
        } => {
            print_stream(trusted_activities::iter_all(client, activity_type), &output).await?;
            Ok(())
        }
        TrustedActivitiesCommands::Show {
            activity_id,
            output,
        } => print_one(
            &trusted_activities::get_activity(client, &activity_id).await?,
            &output,
        ),
        TrustedActivitiesCommands::Delete { activity_id } => {
            trusted_activities::delete_activity(client, &activity_id).await?;
            eprintln!("Deleted trusted activity {activity_id}");
            Ok(())
        }
    }
}
