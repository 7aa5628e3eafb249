pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, PlanCommands, PlanFormat};
pub use config::{load_config, FleetConfig};
