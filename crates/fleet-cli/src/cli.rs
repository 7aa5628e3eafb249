use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-year fleet transition planner", long_about = None)]
pub struct Cli {
    /// Set the logging level (defaults to the config file's [logging] level)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to ~/.fleetplan/config.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fleet transition planning
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

/// Output format for solved plans
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlanFormat {
    /// Year, ID, Vintage, Type, Num_Vehicles rows
    #[default]
    Csv,
    /// Status, objective and plan rows
    Json,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Build and solve the fleet plan
    Solve {
        /// Directory holding the input CSV tables
        #[arg(long, value_hint = ValueHint::DirPath)]
        data: Option<PathBuf>,
        /// First planning year
        #[arg(long)]
        start: Option<u16>,
        /// Last planning year (inclusive)
        #[arg(long)]
        end: Option<u16>,
        /// MILP backend (microlp, or highs when built with solver-highs)
        #[arg(long)]
        solver: Option<String>,
        /// Stop the solver after this many seconds
        #[arg(long, value_name = "SECONDS")]
        time_limit: Option<f64>,
        /// Write the plan to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = PlanFormat::Csv)]
        format: PlanFormat,
        /// Fail when a demand segment has no eligible vehicle model
        #[arg(long)]
        strict_coverage: bool,
    },
    /// Load and validate the input tables without solving
    Validate {
        /// Directory holding the input CSV tables
        #[arg(long, value_hint = ValueHint::DirPath)]
        data: Option<PathBuf>,
        /// First planning year
        #[arg(long)]
        start: Option<u16>,
        /// Last planning year (inclusive)
        #[arg(long)]
        end: Option<u16>,
    },
    /// Show the precomputed cost schedule of one vehicle model
    Schedule {
        /// Vehicle model ID (e.g. BEV_S1_2023)
        #[arg(long)]
        vehicle: String,
        /// Directory holding the input CSV tables
        #[arg(long, value_hint = ValueHint::DirPath)]
        data: Option<PathBuf>,
        /// First planning year
        #[arg(long)]
        start: Option<u16>,
        /// Last planning year (inclusive)
        #[arg(long)]
        end: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_solve() {
        let cli = Cli::parse_from([
            "fleet-cli",
            "--log-level",
            "debug",
            "plan",
            "solve",
            "--data",
            "Dataset",
            "--start",
            "2023",
            "--end",
            "2030",
            "--format",
            "json",
            "--strict-coverage",
        ]);
        assert_eq!(cli.log_level, Some(tracing::Level::DEBUG));
        match cli.command {
            Some(Commands::Plan {
                command:
                    PlanCommands::Solve {
                        start,
                        end,
                        format,
                        strict_coverage,
                        ..
                    },
            }) => {
                assert_eq!(start, Some(2023));
                assert_eq!(end, Some(2030));
                assert_eq!(format, PlanFormat::Json);
                assert!(strict_coverage);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_config_is_global() {
        let cli = Cli::parse_from([
            "fleet-cli",
            "plan",
            "validate",
            "--config",
            "fleet.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("fleet.toml")));
    }
}
