use super::{print_list, print_one, print_stream};
use crate::cases::{self, CaseUpdate, NewCase};
use crate::cli::args::{CaseFields, CaseFileEventsCommands, CasesCommands};
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::users::resolve_user_id;

pub async fn handle_cases_command(command: CasesCommands, client: &IncydrClient) -> Result<()> {
    match command {
        CasesCommands::List(output) => {
            print_stream(cases::iter_all(client), &output).await?;
            Ok(())
        }
        CasesCommands::Show { number, output } => {
            print_one(&cases::get_case(client, number).await?, &output)
        }
        CasesCommands::Create(fields) => {
            let fields = resolve_people(client, fields).await?;
            let name = fields.name.ok_or_else(|| {
                IncydrError::Validation("--name is required to create a case".to_string())
            })?;
            let case = cases::create_case(
                client,
                &NewCase {
                    name,
                    assignee: fields.assignee,
                    description: fields.description,
                    findings: fields.findings,
                    subject: fields.subject,
                },
            )
            .await?;
            println!("{}", case.number);
            Ok(())
        }
        CasesCommands::Update {
            number,
            fields,
            status,
        } => {
            let fields = resolve_people(client, fields).await?;
            let update = CaseUpdate {
                name: fields.name,
                assignee: fields.assignee,
                description: fields.description,
                findings: fields.findings,
                subject: fields.subject,
                status,
            };
            cases::update_case(client, number, update).await?;
            eprintln!("Updated case {number}");
            Ok(())
        }
        CasesCommands::Delete { number } => {
            cases::delete_case(client, number).await?;
            eprintln!("Deleted case {number}");
            Ok(())
        }
        CasesCommands::FileEvents(cmd) => match cmd {
            CaseFileEventsCommands::List { number, output } => {
                let events = cases::list_file_events(client, number).await?;
                print_list(&events, &output)?;
                Ok(())
            }
            CaseFileEventsCommands::Add { number, event_id } => {
                cases::add_file_event(client, number, &event_id).await?;
                eprintln!("Added event {event_id} to case {number}");
                Ok(())
            }
            CaseFileEventsCommands::Remove { number, event_id } => {
                cases::delete_file_event(client, number, &event_id).await?;
                eprintln!("Removed event {event_id} from case {number}");
                Ok(())
            }
        },
    }
}

/// Replaces usernames in `--assignee` / `--subject` with user ids.
async fn resolve_people(client: &IncydrClient, mut fields: CaseFields) -> Result<CaseFields> {
    if let Some(assignee) = &fields.assignee {
        fields.assignee = Some(resolve_user_id(client, assignee).await?);
    }
    if let Some(subject) = &fields.subject {
        fields.subject = Some(resolve_user_id(client, subject).await?);
    }
    Ok(fields)
}
