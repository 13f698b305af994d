use anyhow::{bail, Context, Result};
use eroi_cli::{load_config, save_config, ConfigCommands, PipelineConfig};

pub fn handle(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init {
            path,
            data_path,
            force,
        } => {
            if path.exists() && !force {
                bail!(
                    "'{}' already exists; pass --force to replace it",
                    path.display()
                );
            }
            let mut config = PipelineConfig::default();
            if let Some(data_path) = data_path {
                config.data_path = data_path.clone();
            }
            save_config(path, &config)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        ConfigCommands::Check { path } => {
            let config = load_config(path)?;
            let text = toml::to_string_pretty(&config).context("serializing configuration")?;
            println!("{text}");
            Ok(())
        }
    }
}
