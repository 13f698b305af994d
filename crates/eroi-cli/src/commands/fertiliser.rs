use anyhow::Result;
use eroi_batch::fertiliser_energy;
use eroi_cli::load_config;
use std::path::Path;

pub fn handle(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let report = fertiliser_energy(&config.layout(), &config.fertiliser)?;
    println!(
        "fertiliser energy footprint: {} rows ({} without intensity) -> {}",
        report.rows,
        report.unmatched,
        report.output.display()
    );
    if report.diagnostics.has_issues() {
        print!("{}", report.diagnostics);
    }
    Ok(())
}
