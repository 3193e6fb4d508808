use super::{print_one, print_stream, report_bulk};
use crate::agents::{self, AgentFilter};
use crate::cli::args::AgentsCommands;
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};

/// Column holding agent ids in bulk input files.
const BULK_AGENT_COLUMN: &str = "agent_id";

pub async fn handle_agents_command(command: AgentsCommands, client: &IncydrClient) -> Result<()> {
    match command {
        AgentsCommands::List {
            active,
            healthy,
            output,
        } => {
            let filter = AgentFilter {
                active,
                agent_healthy: healthy,
            };
            print_stream(agents::iter_all(client, filter), &output).await?;
            Ok(())
        }
        AgentsCommands::Show { agent_id, output } => {
            print_one(&agents::get_agent(client, &agent_id).await?, &output)
        }
        AgentsCommands::Update {
            agent_id,
            external_reference,
            clear_external_reference,
        } => {
            if external_reference.is_none() && !clear_external_reference {
                return Err(IncydrError::Validation(
                    "pass --external-reference or --clear-external-reference".to_string(),
                ));
            }
            agents::update_agent(client, &agent_id, external_reference.as_deref()).await?;
            eprintln!("Updated agent {agent_id}");
            Ok(())
        }
        AgentsCommands::BulkActivate(input) => {
            let ids = input.read_column(BULK_AGENT_COLUMN)?;
            report_bulk("activate", agents::bulk_activate(client, &ids).await)
        }
        AgentsCommands::BulkDeactivate(input) => {
            let ids = input.read_column(BULK_AGENT_COLUMN)?;
            report_bulk("deactivate", agents::bulk_deactivate(client, &ids).await)
        }
    }
}
