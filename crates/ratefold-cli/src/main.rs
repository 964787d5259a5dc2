mod cli;
mod commands;
mod envelope;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use ratefold_core::{RateService, RatesConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let mut config = RatesConfig::from_env()?;
    if cli.timeout_ms.is_some() {
        config = config.with_timeout_ms(cli.timeout_ms);
    }
    let service = RateService::new(&config)?;

    if let Command::Watch(args) = &cli.command {
        commands::watch::run(args, &service, cli.pretty).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let envelope = commands::run(&cli, &service).await?;
    output::render(&envelope, cli.pretty)?;

    // Defaults were served: the data is a placeholder, not a real quote.
    if envelope.all_sources_failed() {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}
