use super::{print_list, print_one, print_stream, report_bulk};
use crate::cli::args::{RoleMode, UsersCommands};
use crate::client::IncydrClient;
use crate::error::Result;
use crate::users::{self, resolve_user_id, UserFilter};

/// Column holding user ids in bulk input files.
const BULK_USER_COLUMN: &str = "user";

pub async fn handle_users_command(command: UsersCommands, client: &IncydrClient) -> Result<()> {
    match command {
        UsersCommands::List {
            active,
            inactive,
            blocked,
            username,
            output,
        } => {
            let filter = UserFilter {
                active: match (active, inactive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                blocked,
                username,
            };
            print_stream(users::iter_all(client, filter), &output).await?;
            Ok(())
        }
        UsersCommands::Show { user, output } => {
            let user = if user.contains('@') {
                users::get_user_by_username(client, &user).await?
            } else {
                users::get_user(client, &user).await?
            };
            print_one(&user, &output)
        }
        UsersCommands::Devices { user, output } => {
            let user_id = resolve_user_id(client, &user).await?;
            let devices = users::get_devices(client, &user_id, 1, client.page_size()).await?;
            print_list(&devices, &output)?;
            Ok(())
        }
        UsersCommands::Roles { user, output } => {
            let user_id = resolve_user_id(client, &user).await?;
            print_list(&users::get_roles(client, &user_id).await?, &output)?;
            Ok(())
        }
        UsersCommands::UpdateRoles { user, roles, mode } => {
            let user_id = resolve_user_id(client, &user).await?;
            match mode {
                RoleMode::Replace => users::update_roles(client, &user_id, &roles).await?,
                RoleMode::Add => users::add_roles(client, &user_id, &roles).await?,
                RoleMode::Remove => users::remove_roles(client, &user_id, &roles).await?,
            }
            eprintln!("Updated roles for {user}");
            Ok(())
        }
        UsersCommands::Activate { user } => {
            let user_id = resolve_user_id(client, &user).await?;
            users::activate(client, &user_id).await?;
            eprintln!("Activated {user}");
            Ok(())
        }
        UsersCommands::Deactivate { user } => {
            let user_id = resolve_user_id(client, &user).await?;
            users::deactivate(client, &user_id).await?;
            eprintln!("Deactivated {user}");
            Ok(())
        }
        UsersCommands::Move { user, org_guid } => {
            let user_id = resolve_user_id(client, &user).await?;
            users::move_user(client, &user_id, &org_guid).await?;
            eprintln!("Moved {user} to org {org_guid}");
            Ok(())
        }
        UsersCommands::BulkActivate(input) => {
            let ids = input.read_column(BULK_USER_COLUMN)?;
            report_bulk("activate", users::bulk_activate(client, &ids).await)
        }
        UsersCommands::BulkDeactivate(input) => {
            let ids = input.read_column(BULK_USER_COLUMN)?;
            report_bulk("deactivate", users::bulk_deactivate(client, &ids).await)
        }
    }
}
