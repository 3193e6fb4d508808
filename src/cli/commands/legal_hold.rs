use super::{print_one, print_stream};
use crate::cli::args::LegalHoldCommands;
use crate::client::IncydrClient;
use crate::error::Result;
use crate::legal_hold::{self, MatterFilter, NewMatter};
use crate::users::resolve_user_id;

pub async fn handle_legal_hold_command(
    command: LegalHoldCommands,
    client: &IncydrClient,
) -> Result<()> {
    match command {
        LegalHoldCommands::List {
            active,
            name,
            output,
        } => {
            let filter = MatterFilter {
                active,
                name,
                ..Default::default()
            };
            print_stream(legal_hold::iter_all(client, filter), &output).await?;
            Ok(())
        }
        LegalHoldCommands::Show { matter_id, output } => {
            print_one(&legal_hold::get_matter(client, &matter_id).await?, &output)
        }
        LegalHoldCommands::Create {
            name,
            policy_id,
            description,
            notes,
        } => {
            let matter = legal_hold::create_matter(
                client,
                &NewMatter {
                    name,
                    policy_id,
                    description,
                    notes,
                },
            )
            .await?;
            println!("{}", matter.matter_id);
            Ok(())
        }
        LegalHoldCommands::Deactivate { matter_id } => {
            legal_hold::deactivate_matter(client, &matter_id).await?;
            eprintln!("Deactivated matter {matter_id}");
            Ok(())
        }
        LegalHoldCommands::Reactivate { matter_id } => {
            legal_hold::reactivate_matter(client, &matter_id).await?;
            eprintln!("Reactivated matter {matter_id}");
            Ok(())
        }
        LegalHoldCommands::ListCustodians { matter_id, output } => {
            print_stream(legal_hold::iter_custodians(client, &matter_id), &output).await?;
            Ok(())
        }
        LegalHoldCommands::AddCustodian { matter_id, user } => {
            let user_id = resolve_user_id(client, &user).await?;
            legal_hold::add_custodian(client, &matter_id, &user_id).await?;
            eprintln!("Added {user} to matter {matter_id}");
            Ok(())
        }
        LegalHoldCommands::RemoveCustodian { matter_id, user } => {
            let user_id = resolve_user_id(client, &user).await?;
            legal_hold::remove_custodian(client, &matter_id, &user_id).await?;
            eprintln!("Removed {user} from matter {matter_id}");
            Ok(())
        }
    }
}
