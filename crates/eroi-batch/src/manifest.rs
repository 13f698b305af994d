//! JSON record of one batch run: which stage and variant ran over which
//! years, and how each year ended.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

use crate::job::{BatchJobRecord, TaskKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub task: TaskKind,
    /// Scenario of upstream runs, negative handling of biomass runs
    pub variant: String,
    pub data_path: String,
    /// Requested years in ascending order
    pub years: Vec<i32>,
    pub success: usize,
    pub failure: usize,
    /// Diagonal coefficients replaced over all successful years
    pub clipped: usize,
    pub warnings: usize,
    pub jobs: Vec<BatchJobRecord>,
}

impl BatchManifest {
    /// Summarise finished jobs; records are ordered by year.
    pub fn from_records(
        task: TaskKind,
        variant: &str,
        data_path: &Path,
        mut jobs: Vec<BatchJobRecord>,
    ) -> Self {
        jobs.sort_by_key(|job| job.year);
        let success = jobs.iter().filter(|job| job.is_ok()).count();
        Self {
            created_at: Utc::now(),
            task,
            variant: variant.to_string(),
            data_path: data_path.display().to_string(),
            years: jobs.iter().map(|job| job.year).collect(),
            success,
            failure: jobs.len() - success,
            clipped: jobs.iter().map(|job| job.clipped).sum(),
            warnings: jobs.iter().map(|job| job.diagnostics.warning_count()).sum(),
            jobs,
        }
    }

    pub fn job(&self, year: i32) -> Option<&BatchJobRecord> {
        self.jobs.iter().find(|job| job.year == year)
    }

    pub fn failed_years(&self) -> Vec<i32> {
        self.jobs
            .iter()
            .filter(|job| !job.is_ok())
            .map(|job| job.year)
            .collect()
    }
}

pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(manifest).context("serializing batch manifest to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing batch manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_batch_manifest(path: &Path) -> Result<BatchManifest> {
    let file = File::open(path)
        .with_context(|| format!("opening batch manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing batch manifest '{}'", path.display()))
}
