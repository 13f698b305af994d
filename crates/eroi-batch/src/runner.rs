use crate::job::{BatchJobRecord, TaskKind, YearJob};
use crate::manifest::{write_batch_manifest, BatchManifest};
use crate::pipeline::{biomass_year, eroi_of_food_upstream, PipelineSettings, YearReport};
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use tracing::{info, warn};

pub struct BatchRunnerConfig {
    pub jobs: Vec<YearJob>,
    /// Directory receiving `batch_manifest.json`
    pub output_root: PathBuf,
    pub task: TaskKind,
    pub settings: PipelineSettings,
    /// Worker threads; 0 means one per logical CPU
    pub workers: usize,
}

/// Summary returned after the run so callers can report counts and the manifest location.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

pub fn run_batch(config: &BatchRunnerConfig) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.workers == 0 {
        num_cpus::get()
    } else {
        config.workers
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for year jobs")?;
    info!(
        task = config.task.as_str(),
        jobs = config.jobs.len(),
        workers = thread_count,
        "starting batch"
    );

    // Years share no state; a failing year only marks its own record.
    let job_records: Vec<BatchJobRecord> = pool.install(|| {
        config
            .jobs
            .par_iter()
            .map(|job| run_job(job, config))
            .collect()
    });

    let manifest = BatchManifest::from_records(
        config.task,
        config.settings.variant(config.task),
        config.settings.layout.root(),
        job_records,
    );
    let manifest_path = config.output_root.join("batch_manifest.json");
    write_batch_manifest(&manifest_path, &manifest)?;
    if manifest.failure > 0 {
        warn!(years = ?manifest.failed_years(), "batch finished with failed years");
    }
    info!(
        success = manifest.success,
        clipped = manifest.clipped,
        warnings = manifest.warnings,
        "batch finished"
    );
    Ok(BatchSummary {
        success: manifest.success,
        failure: manifest.failure,
        manifest_path,
        jobs: manifest.jobs,
    })
}

/// Run one year, turning both errors and panics into a failed record.
fn run_job(job: &YearJob, config: &BatchRunnerConfig) -> BatchJobRecord {
    let settings = &config.settings;
    let runner = || -> Result<YearReport> {
        match job.task {
            TaskKind::Upstream => eroi_of_food_upstream(job.year, &settings.layout, &settings.upstream),
            TaskKind::Biomass => biomass_year(job.year, &settings.layout, &settings.biomass),
        }
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(runner))
        .unwrap_or_else(|payload| Err(anyhow!("job panicked: {}", panic_message(payload.as_ref()))));

    match outcome {
        Ok(report) => BatchJobRecord {
            job_id: job.job_id.clone(),
            year: job.year,
            status: "ok".to_string(),
            error: None,
            outputs: report
                .outputs
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            clipped: report.clipped,
            diagnostics: report.diagnostics,
        },
        Err(err) => {
            warn!(job = %job.job_id, "batch job failed: {err:#}");
            BatchJobRecord {
                job_id: job.job_id.clone(),
                year: job.year,
                status: "error".to_string(),
                error: Some(format!("{err:#}")),
                outputs: Vec::new(),
                clipped: 0,
                diagnostics: Default::default(),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
