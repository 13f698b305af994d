//! Year pipelines: read inputs, run the algorithms, persist results.

use crate::job::TaskKind;
use anyhow::{Context, Result};
use eroi_algo::biomass::biomass_footprint;
use eroi_algo::intensity::{output_vector, OUTPUT_COLUMN};
use eroi_algo::{
    aggregate_by_product, energy_footprint, extension_intensity, fill_missing_regions,
    fill_timeseries, upstream_impact, BiomassOptions, ConsumptionRecord, IntensityRecord, IoSystem,
    Scenario, SectorLists, TimeseriesSettings, UpstreamOptions,
};
use eroi_core::Diagnostics;
use eroi_io::{
    delimiter_for, read_matrix, read_records, read_region_codes, read_region_table, write_matrix,
    write_records, DataLayout,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, info_span};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub sectors: SectorLists,
    #[serde(default)]
    pub options: UpstreamOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomassSettings {
    #[serde(flatten)]
    pub options: BiomassOptions,
    /// Row label levels of the transaction and final-demand tables
    #[serde(default = "default_label_levels")]
    pub label_levels: usize,
}

fn default_label_levels() -> usize {
    2
}

impl Default for BiomassSettings {
    fn default() -> Self {
        Self {
            options: BiomassOptions::default(),
            label_levels: default_label_levels(),
        }
    }
}

/// Everything a batch worker needs besides the year.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub layout: DataLayout,
    pub upstream: UpstreamSettings,
    pub biomass: BiomassSettings,
}

impl PipelineSettings {
    /// Setting that distinguishes the outputs of `task`.
    pub fn variant(&self, task: TaskKind) -> &'static str {
        match task {
            TaskKind::Upstream => self.upstream.scenario.as_str(),
            TaskKind::Biomass => self.biomass.options.negatives_tag(),
        }
    }
}

/// Outcome of one year of one stage.
#[derive(Debug, Clone)]
pub struct YearReport {
    pub year: i32,
    pub outputs: Vec<PathBuf>,
    pub clipped: usize,
    pub diagnostics: Diagnostics,
}

/// Upstream energy of primary and processed food for one year.
///
/// Reads the year's `A`, `Y`, `x` and energy extension, builds intensities,
/// runs both partitions of the configured scenario and writes the target
/// perspective of each, summed per energy carrier.
pub fn eroi_of_food_upstream(
    year: i32,
    layout: &DataLayout,
    settings: &UpstreamSettings,
) -> Result<YearReport> {
    let _span = info_span!("upstream", year).entered();
    let partitions = settings
        .sectors
        .scenario_partitions(settings.scenario)
        .context("building sector partitions")?;

    let a = read_matrix(&layout.technical_coefficients(year), 2, 2)?;
    let y = read_matrix(&layout.final_demand(year), 2, 2)?;
    let x = read_matrix(&layout.total_output(year), 2, 1)?;
    let f = read_matrix(&layout.energy_extension(year), 2, 2)?;

    let output = output_vector(&x, OUTPUT_COLUMN, f.cols())?;
    let (s, mut diagnostics) = extension_intensity(&f, &output)?;
    let system = IoSystem::new(a, y, s)?;

    let suffix = partitions.scenario.output_suffix();
    let targets = [
        (&partitions.primary, layout.primary_output(year, suffix)),
        (&partitions.processed, layout.processed_output(year, suffix)),
    ];
    let mut tables = Vec::with_capacity(targets.len());
    let mut clipped = 0;
    for (partition, path) in targets {
        let result = upstream_impact(&system, partition, &settings.options)
            .with_context(|| format!("{} partition of {}", partition.name, year))?;
        clipped += result.clipped_count();
        diagnostics.merge(result.diagnostics());
        tables.push((path, aggregate_by_product(&result.target_perspective)?));
    }
    // nothing is written until both partitions are computed
    let mut outputs = Vec::with_capacity(tables.len());
    for (path, table) in tables {
        write_matrix(&path, &table)?;
        outputs.push(path);
    }
    diagnostics.tag_year(year);

    info!(
        scenario = partitions.scenario.as_str(),
        clipped,
        warnings = diagnostics.warning_count(),
        "upstream energy written"
    );
    Ok(YearReport {
        year,
        outputs,
        clipped,
        diagnostics,
    })
}

/// Diagonal coefficient found at or above one in a biomass table.
#[derive(Debug, Serialize)]
struct DiagonalIssueRow<'a> {
    year: i32,
    label: &'a str,
    #[serde(rename = "A_diagonal_value")]
    a_diagonal_value: f64,
}

/// Biomass inverse, regional demand and per-region footprints for one year.
pub fn biomass_year(year: i32, layout: &DataLayout, settings: &BiomassSettings) -> Result<YearReport> {
    let _span = info_span!("biomass", year).entered();
    let levels = settings.label_levels;
    let z = read_matrix(&layout.fabio_transactions(year), levels, levels)?;
    let y = read_matrix(&layout.fabio_final_demand(year), levels, 2)?;

    let footprint = biomass_footprint(&z, &y, &settings.options)
        .with_context(|| format!("biomass footprint of {year}"))?;
    let tag = settings.options.negatives_tag();

    let mut outputs = vec![
        layout.biomass_inverse(year, tag),
        layout.biomass_regional_demand(year, tag),
    ];
    write_matrix(&outputs[0], &footprint.l)?;
    write_matrix(&outputs[1], &footprint.y_region)?;

    let dir = layout.biomass_footprint_dir(year, tag);
    let regions = footprint.regions();
    let written: Vec<PathBuf> = regions
        .par_iter()
        .map(|region| -> Result<PathBuf> {
            let path = dir.join(format!("{region}.tsv"));
            write_matrix(&path, &footprint.region_footprint(region)?)?;
            Ok(path)
        })
        .collect::<Result<_>>()?;
    outputs.extend(written);

    let issues: Vec<DiagonalIssueRow> = footprint
        .diagonal_issues()
        .iter()
        .map(|c| DiagonalIssueRow {
            year,
            label: &c.label,
            a_diagonal_value: c.original,
        })
        .collect();
    let issues_path = dir.join("A_diagonal_issues.tsv");
    write_records(&issues_path, &issues, b'\t')?;
    outputs.push(issues_path);

    let mut diagnostics = footprint.report.to_diagnostics(&format!("biomass {year}"));
    diagnostics.tag_year(year);
    info!(
        regions = regions.len(),
        clipped = footprint.report.clipped_count(),
        "biomass footprints written"
    );
    Ok(YearReport {
        year,
        outputs,
        clipped: footprint.report.clipped_count(),
        diagnostics,
    })
}

#[derive(Debug, Clone)]
pub struct FertiliserReport {
    pub rows: usize,
    /// Consumption rows without a matching intensity
    pub unmatched: usize,
    pub output: PathBuf,
    pub diagnostics: Diagnostics,
}

/// Gap-fill fertiliser energy intensities and apply them to fertiliser use.
pub fn fertiliser_energy(layout: &DataLayout, settings: &TimeseriesSettings) -> Result<FertiliserReport> {
    let intensity_path = layout.fertiliser_intensities();
    let records: Vec<IntensityRecord> = read_records(&intensity_path, delimiter_for(&intensity_path))?;
    let regions = read_region_codes(&layout.fabio_regions())?;
    let table = read_region_table(&layout.region_table())?;

    let (filled, diagnostics) = fill_missing_regions(&records, &regions, &table)
        .context("filling fertiliser intensities for missing regions")?;
    let series = fill_timeseries(&filled, settings)?;

    // tab-separated despite the extension
    let consumption: Vec<ConsumptionRecord> = read_records(&layout.fertiliser_use(), b'\t')?;
    let footprint = energy_footprint(&consumption, &series);
    let unmatched = footprint.iter().filter(|r| r.energy_footprint.is_none()).count();

    let output = layout.fertiliser_footprint();
    write_records(&output, &footprint, b'\t')?;
    info!(
        rows = footprint.len(),
        unmatched,
        filled = filled.len(),
        "fertiliser energy footprint written"
    );
    Ok(FertiliserReport {
        rows: footprint.len(),
        unmatched,
        output,
        diagnostics,
    })
}
