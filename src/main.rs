//! CLI entry point for incydr, a Code42 Incydr API client.
//!
//! Loads settings (arguments, environment, `.env` files), installs the
//! tracing subscriber, then dispatches the subcommand.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (configuration, auth failure, API error, failed bulk items)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use clap::Parser;

use incydr::cli::args::Cli;
use incydr::cli::commands::handle_command;
use incydr::client::IncydrClient;
use incydr::error::Result;
use incydr::logging;
use incydr::settings::IncydrSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = IncydrSettings::load(&cli.overrides())?;
    logging::init(&settings)?;
    let client = IncydrClient::new(&settings)?;
    handle_command(cli.command, &client).await
}
