//! TOML description of a pipeline run.

use anyhow::{bail, Context, Result};
use eroi_algo::{Scenario, SectorLists, TimeseriesSettings, UpstreamOptions};
use eroi_batch::{BiomassSettings, PipelineSettings, UpstreamSettings};
use eroi_io::DataLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Years to process: an inclusive range or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearSelection {
    // listed first: a two-element array would otherwise match `Range`
    List(Vec<i32>),
    Range { first: i32, last: i32 },
}

impl Default for YearSelection {
    fn default() -> Self {
        YearSelection::Range {
            first: 1995,
            last: 2020,
        }
    }
}

impl YearSelection {
    pub fn years(&self) -> Result<Vec<i32>> {
        match self {
            YearSelection::Range { first, last } => {
                if first > last {
                    bail!("year range {first}..={last} is empty");
                }
                Ok((*first..=*last).collect())
            }
            YearSelection::List(years) => {
                if years.is_empty() {
                    bail!("year list is empty");
                }
                Ok(years.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the `raw/`, `interim/` and `EXIOBASE/` data tree
    pub data_path: PathBuf,
    #[serde(default)]
    pub years: YearSelection,
    /// Worker threads; 0 means one per logical CPU
    #[serde(default)]
    pub workers: usize,
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub remove_negative_demand: bool,
    #[serde(default)]
    pub sectors: SectorLists,
    #[serde(default)]
    pub biomass: BiomassSettings,
    #[serde(default)]
    pub fertiliser: TimeseriesSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            years: YearSelection::default(),
            workers: 0,
            scenario: Scenario::default(),
            remove_negative_demand: false,
            sectors: SectorLists::default(),
            biomass: BiomassSettings::default(),
            fertiliser: TimeseriesSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Sector lists and scenario are checked here, before any job starts.
    pub fn validate(&self) -> Result<()> {
        self.years.years()?;
        self.sectors
            .scenario_partitions(self.scenario)
            .context("invalid sector configuration")?;
        self.fertiliser
            .validate()
            .context("invalid fertiliser time series configuration")?;
        Ok(())
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_path)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            layout: self.layout(),
            upstream: UpstreamSettings {
                scenario: self.scenario,
                sectors: self.sectors.clone(),
                options: UpstreamOptions {
                    remove_negative_demand: self.remove_negative_demand,
                    ..UpstreamOptions::default()
                },
            },
            biomass: self.biomass.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading configuration '{}'", path.display()))?;
    let config: PipelineConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing configuration '{}'", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &PipelineConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("serializing configuration")?;
    fs::write(path, contents)
        .with_context(|| format!("writing configuration '{}'", path.display()))?;
    Ok(())
}
