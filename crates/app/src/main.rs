//! PMS Console - Main Entry Point

use std::process::ExitCode;

use clap::Parser;
use pms_application::{ApiError, user_message};
use pms_console::{Cli, Console, commands};
use pms_infrastructure::{init_tracing, load_settings};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match error.downcast_ref::<ApiError>() {
                Some(api_error) => eprintln!("{}", user_message(api_error)),
                None => eprintln!("error: {error:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    info!(base_url = %settings.base_url, "PMS console v{}", env!("CARGO_PKG_VERSION"));

    let mut console = Console::new(settings).await?;
    let outcome = commands::run(&console, cli.command).await;
    if let Some(notice) = console.session_notice() {
        eprintln!("{notice}");
    }
    outcome
}
