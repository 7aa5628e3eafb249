use clap::Parser;
use fleet_cli::{load_config, Cli, Commands};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = match cli.log_level {
        Some(level) => level,
        None => match config.log_level() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("error: {:#}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {}", e);
    }

    match &cli.command {
        Some(Commands::Plan { command }) => match commands::plan::handle(command, &config) {
            Ok(code) => code,
            Err(e) => {
                error!("plan command failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        None => {
            info!("No subcommand provided. Use `fleet-cli --help` for more information.");
            ExitCode::SUCCESS
        }
    }
}
