pub mod cli;
pub mod config;

pub use cli::{build_cli_command, Cli, Commands, ConfigCommands};
pub use config::{load_config, save_config, PipelineConfig, YearSelection};
