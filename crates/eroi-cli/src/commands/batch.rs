use anyhow::{bail, Result};
use eroi_batch::{jobs_for_years, run_batch, BatchRunnerConfig, TaskKind};
use eroi_cli::load_config;
use std::path::Path;
use tracing::info;

/// Fan a per-year stage out over the configured years.
pub fn handle(config_path: &Path, task: TaskKind, year: Option<i32>, workers: Option<usize>) -> Result<()> {
    let config = load_config(config_path)?;
    let years = match year {
        Some(year) => vec![year],
        None => config.years.years()?,
    };
    let jobs = jobs_for_years(&years, task);
    let output_root = config
        .data_path
        .join("interim")
        .join("batch")
        .join(task.as_str());
    info!(
        task = task.as_str(),
        years = jobs.len(),
        data = %config.data_path.display(),
        "running batch"
    );

    let runner = BatchRunnerConfig {
        jobs,
        output_root,
        task,
        settings: config.pipeline_settings(),
        workers: workers.unwrap_or(config.workers),
    };
    let summary = run_batch(&runner)?;
    println!(
        "{} {} -> {}/{} ok/fail (manifest {})",
        task.as_str(),
        summary.jobs.len(),
        summary.success,
        summary.failure,
        summary.manifest_path.display()
    );
    for job in summary.jobs.iter().filter(|job| !job.is_ok()) {
        println!("  {} failed: {}", job.job_id, job.error.as_deref().unwrap_or("unknown error"));
    }
    if summary.failure > 0 {
        bail!("{} of {} years failed", summary.failure, summary.jobs.len());
    }
    Ok(())
}
