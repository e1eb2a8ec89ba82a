//! Entry point for the `confvault` command line.

use std::process::ExitCode;

use clap::Parser;

use confvault_cli::{App, Cli, Configuration, render_error, startup};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let configuration = Configuration::load(cli.config.as_deref(), cli.database_url.clone())?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let db = configuration.database_connection().await?;
    let app = App::new(db, configuration.lock_stale_after());

    match app.run(cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            println!("{}", serde_json::to_string_pretty(&render_error(&err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
