use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Energy return on investment of the global food system", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upstream energy of primary crops and processed food, per year
    Upstream {
        /// Pipeline configuration (TOML)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Run a single year instead of the configured selection
        #[arg(long)]
        year: Option<i32>,
        /// Override the configured worker count (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Biomass Leontief inverse and regional footprints, per year
    Biomass {
        /// Pipeline configuration (TOML)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Energy footprint of fertiliser use with gap-filled intensities
    Fertiliser {
        /// Pipeline configuration (TOML)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        /// Data root written into the file
        #[arg(long)]
        data_path: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Parse and validate a configuration, then print the effective values
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn upstream_flags_parse() {
        let cli = Cli::try_parse_from([
            "eroi", "upstream", "--config", "eroi.toml", "--year", "2010", "--workers", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Upstream { year, workers, .. } => {
                assert_eq!(year, Some(2010));
                assert_eq!(workers, Some(4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
