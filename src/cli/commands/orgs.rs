use super::{print_list, print_one};
use crate::cli::args::{OrgFields, OrgsCommands};
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::orgs::{self, OrgRequest};

pub async fn handle_orgs_command(command: OrgsCommands, client: &IncydrClient) -> Result<()> {
    match command {
        OrgsCommands::List { inactive, output } => {
            print_list(&orgs::list_orgs(client, !inactive).await?, &output)?;
            Ok(())
        }
        OrgsCommands::Show { org, output } => {
            // Unknown guids 404; fall back to an exact name match.
            let found = match orgs::get_org(client, &org).await {
                Ok(found) => found,
                Err(IncydrError::Api { status, .. }) if status == reqwest::StatusCode::NOT_FOUND => {
                    orgs::get_org_by_name(client, &org).await?
                }
                Err(err) => return Err(err),
            };
            print_one(&found, &output)
        }
        OrgsCommands::Create(fields) => {
            let created = orgs::create_org(client, &org_request(fields)).await?;
            println!("{}", created.org_guid);
            Ok(())
        }
        OrgsCommands::Update { org_guid, fields } => {
            orgs::update_org(client, &org_guid, &org_request(fields)).await?;
            eprintln!("Updated org {org_guid}");
            Ok(())
        }
        OrgsCommands::Activate { org_guid } => {
            orgs::activate(client, &org_guid).await?;
            eprintln!("Activated org {org_guid}");
            Ok(())
        }
        OrgsCommands::Deactivate { org_guid } => {
            orgs::deactivate(client, &org_guid).await?;
            eprintln!("Deactivated org {org_guid}");
            Ok(())
        }
    }
}

fn org_request(fields: OrgFields) -> OrgRequest {
    OrgRequest {
        org_name: fields.name,
        org_ext_ref: fields.ext_ref,
        notes: fields.notes,
        parent_org_guid: fields.parent_org_guid,
    }
}
