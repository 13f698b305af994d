use clap::Parser;
use eroi_batch::TaskKind;
use eroi_cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Upstream {
            config,
            year,
            workers,
        } => {
            info!("Upstream energy with configuration {}", config.display());
            commands::batch::handle(config, TaskKind::Upstream, *year, *workers)
        }
        Commands::Biomass {
            config,
            year,
            workers,
        } => {
            info!("Biomass footprints with configuration {}", config.display());
            commands::batch::handle(config, TaskKind::Biomass, *year, *workers)
        }
        Commands::Fertiliser { config } => {
            info!("Fertiliser energy with configuration {}", config.display());
            commands::fertiliser::handle(config)
        }
        Commands::Config { command } => commands::config::handle(command),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
