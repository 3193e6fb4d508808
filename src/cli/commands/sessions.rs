use chrono::Utc;

use super::{print_one, print_stream};
use crate::cli::args::SessionsCommands;
use crate::client::IncydrClient;
use crate::dates::DateInput;
use crate::error::Result;
use crate::sessions::{self, SessionFilter};

pub async fn handle_sessions_command(command: SessionsCommands, client: &IncydrClient) -> Result<()> {
    match command {
        SessionsCommands::List {
            actor,
            start,
            end,
            has_alerts,
            state,
            output,
        } => {
            let filter = SessionFilter {
                actor,
                on_or_after: start.as_deref().map(epoch_millis).transpose()?,
                before: end.as_deref().map(epoch_millis).transpose()?,
                has_alerts,
                states: state,
            };
            print_stream(sessions::iter_all(client, filter), &output).await?;
            Ok(())
        }
        SessionsCommands::Show { session_id, output } => {
            print_one(&sessions::get_session(client, &session_id).await?, &output)
        }
        SessionsCommands::Update {
            session_id,
            state,
            note,
        } => {
            sessions::update_session(client, &session_id, state, note.as_deref()).await?;
            eprintln!("Updated session {session_id}");
            Ok(())
        }
    }
}

/// Session filters take epoch milliseconds; relative values count back
/// from now.
fn epoch_millis(value: &str) -> Result<i64> {
    Ok(DateInput::parse_with_shorthand(value)?
        .to_absolute(Utc::now())?
        .timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_dates_become_epoch_millis() {
        assert_eq!(epoch_millis("2023-01-01").unwrap(), 1_672_531_200_000);
    }

    #[test]
    fn shorthand_counts_back_from_now() {
        let before = Utc::now().timestamp_millis();
        let value = epoch_millis("1h").unwrap();
        assert!(value <= before - 3_600_000 + 1_000);
        assert!(value >= before - 3_600_000 - 60_000);
    }
}
