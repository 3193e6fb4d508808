use chrono::NaiveDate;

use super::{print_one, print_stream};
use crate::cli::args::RiskProfilesCommands;
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::risk_profiles::{self, DateChange, ProfileFilter, ProfileUpdate};
use crate::users::resolve_user_id;

pub async fn handle_risk_profiles_command(
    command: RiskProfilesCommands,
    client: &IncydrClient,
) -> Result<()> {
    match command {
        RiskProfilesCommands::List {
            manager_id,
            department,
            title,
            active,
            output,
        } => {
            let filter = ProfileFilter {
                manager_id,
                department,
                title,
                active,
                ..Default::default()
            };
            print_stream(risk_profiles::iter_all(client, filter), &output).await?;
            Ok(())
        }
        RiskProfilesCommands::Show { user, output } => {
            let user_id = resolve_user_id(client, &user).await?;
            print_one(&risk_profiles::get_profile(client, &user_id).await?, &output)
        }
        RiskProfilesCommands::Update {
            user,
            notes,
            start_date,
            end_date,
            clear_start_date,
            clear_end_date,
        } => {
            let update = ProfileUpdate {
                notes,
                start_date: date_change(start_date.as_deref(), clear_start_date)?,
                end_date: date_change(end_date.as_deref(), clear_end_date)?,
            };
            if update.notes.is_none()
                && update.start_date == DateChange::Keep
                && update.end_date == DateChange::Keep
            {
                return Err(IncydrError::Validation(
                    "nothing to update: pass --notes, a date, or a --clear-* flag".to_string(),
                ));
            }
            let user_id = resolve_user_id(client, &user).await?;
            risk_profiles::update_profile(client, &user_id, &update).await?;
            eprintln!("Updated risk profile for {user}");
            Ok(())
        }
        RiskProfilesCommands::AddCloudAliases { user, aliases } => {
            let user_id = resolve_user_id(client, &user).await?;
            risk_profiles::add_cloud_aliases(client, &user_id, &aliases).await?;
            eprintln!("Added {} cloud alias(es) to {user}", aliases.len());
            Ok(())
        }
        RiskProfilesCommands::RemoveCloudAliases { user, aliases } => {
            let user_id = resolve_user_id(client, &user).await?;
            risk_profiles::remove_cloud_aliases(client, &user_id, &aliases).await?;
            eprintln!("Removed {} cloud alias(es) from {user}", aliases.len());
            Ok(())
        }
    }
}

fn date_change(value: Option<&str>, clear: bool) -> Result<DateChange> {
    match (value, clear) {
        (_, true) => Ok(DateChange::Clear),
        (Some(text), false) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(DateChange::Set)
            .map_err(|e| IncydrError::DateParse {
                input: text.to_string(),
                reason: format!("expected yyyy-MM-dd ({e})"),
            }),
        (None, false) => Ok(DateChange::Keep),
    }
}
