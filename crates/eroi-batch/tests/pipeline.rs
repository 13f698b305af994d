//! End-to-end year pipelines on a generated miniature data tree

use eroi_algo::{BiomassOptions, Scenario, SectorLists, TimeseriesSettings, UpstreamOptions};
use eroi_batch::{
    biomass_year, eroi_of_food_upstream, fertiliser_energy, jobs_for_years, load_batch_manifest,
    run_batch, BatchRunnerConfig, BiomassSettings, PipelineSettings, TaskKind, UpstreamSettings,
};
use eroi_core::{Label, LabelIndex, LabeledMatrix};
use eroi_io::{read_matrix, write_matrix, DataLayout};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SECTORS: [&str; 4] = ["Farm", "Fert", "Mill", "Power"];

fn sector_labels() -> LabelIndex {
    let mut labels = Vec::new();
    for r in ["R1", "R2"] {
        for s in SECTORS {
            labels.push(Label::pair(r, s));
        }
    }
    LabelIndex::region_sector(labels).unwrap()
}

fn write_exiobase_year(layout: &DataLayout, year: i32) {
    let sectors = sector_labels();
    let demand = LabelIndex::new(
        vec!["region".into(), "category".into()],
        vec![
            Label::pair("R1", "Final consumption expenditure by households"),
            Label::pair("R1", "Exports: Total (fob)"),
            Label::pair("R2", "Final consumption expenditure by households"),
        ],
    )
    .unwrap();
    let a = LabeledMatrix::from_fn(sectors.clone(), sectors.clone(), |i, j| {
        0.01 * (1 + (i + 2 * j) % 5) as f64
    });
    let y = LabeledMatrix::from_fn(sectors.clone(), demand, |i, c| (1 + (i + c) % 3) as f64);
    let x_cols = LabelIndex::flat("", ["indout"]).unwrap();
    // R2/Power produces nothing
    let x = LabeledMatrix::from_fn(sectors.clone(), x_cols, |i, _| if i == 7 { 0.0 } else { 10.0 + i as f64 });
    let f_rows = LabelIndex::new(
        vec!["IEA_product".into(), "flow".into()],
        vec![
            Label::new(["Coal", "Energy use"]),
            Label::new(["Coal", "Losses"]),
            Label::new(["Natural gas", "Energy use"]),
        ],
    )
    .unwrap();
    let f = LabeledMatrix::from_fn(f_rows, sectors, |k, j| (1 + k + j % 2) as f64);

    write_matrix(&layout.technical_coefficients(year), &a).unwrap();
    write_matrix(&layout.final_demand(year), &y).unwrap();
    write_matrix(&layout.total_output(year), &x).unwrap();
    write_matrix(&layout.energy_extension(year), &f).unwrap();
}

fn upstream_settings(scenario: Scenario) -> UpstreamSettings {
    UpstreamSettings {
        scenario,
        sectors: SectorLists {
            agriculture: vec!["Farm".into()],
            fertiliser: vec!["Fert".into()],
            processed: vec!["Mill".into()],
        },
        options: UpstreamOptions::default(),
    }
}

#[test]
fn upstream_year_writes_both_target_perspectives() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_exiobase_year(&layout, 2010);

    let report = eroi_of_food_upstream(2010, &layout, &upstream_settings(Scenario::IncludeFertiliserInChain)).unwrap();
    assert_eq!(report.outputs.len(), 2);
    assert!(report.outputs[0].ends_with("primary_crops_product_incl_fertiliser.tsv"));
    assert!(report.outputs[1].ends_with("processed_food_product_incl_fertiliser.tsv"));
    assert_eq!(report.clipped, 0);
    // the zero-output sector is reported, not fatal
    assert_eq!(report.diagnostics.warning_count(), 1);

    let primary = read_matrix(&report.outputs[0], 1, 2).unwrap();
    assert_eq!(primary.nrows(), 2);
    assert_eq!(primary.ncols(), 2);
    assert!(primary.is_finite());
    assert!(primary.total() > 0.0);
}

#[test]
fn upstream_outputs_are_reproducible() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_exiobase_year(&layout, 2011);
    let settings = upstream_settings(Scenario::ExcludeFertiliserAsCut);

    let first = eroi_of_food_upstream(2011, &layout, &settings).unwrap();
    let bytes = fs::read(&first.outputs[1]).unwrap();
    let second = eroi_of_food_upstream(2011, &layout, &settings).unwrap();
    assert_eq!(fs::read(&second.outputs[1]).unwrap(), bytes);
    assert!(first.outputs[0].ends_with("primary_crops_product.tsv"));
}

#[test]
fn failed_year_does_not_stop_siblings() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_exiobase_year(&layout, 2000);

    let config = BatchRunnerConfig {
        jobs: jobs_for_years(&[2000, 2001], TaskKind::Upstream),
        output_root: dir.path().join("runs"),
        task: TaskKind::Upstream,
        settings: PipelineSettings {
            layout: layout.clone(),
            upstream: upstream_settings(Scenario::IncludeFertiliserInChain),
            biomass: BiomassSettings::default(),
        },
        workers: 2,
    };
    let summary = run_batch(&config).unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failure, 1);

    let manifest = load_batch_manifest(&summary.manifest_path).unwrap();
    assert_eq!(manifest.task, TaskKind::Upstream);
    assert_eq!(manifest.variant, "include-fertiliser-in-chain");
    assert_eq!(manifest.years, vec![2000, 2001]);
    assert_eq!(manifest.failed_years(), vec![2001]);
    let failed = manifest.job(2001).unwrap();
    assert_eq!(failed.status, "error");
    assert!(failed.error.as_deref().unwrap().contains("A.txt"));
    let ok = manifest.job(2000).unwrap();
    assert_eq!(ok.outputs.len(), 2);
    assert_eq!(manifest.warnings, ok.diagnostics.warning_count());
}

#[test]
fn failing_partition_leaves_no_outputs() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_exiobase_year(&layout, 2002);
    let mut settings = upstream_settings(Scenario::IncludeFertiliserInChain);
    // primary resolves, processed does not
    settings.sectors.processed = vec!["Bakery".into()];

    let err = eroi_of_food_upstream(2002, &layout, &settings).unwrap_err();
    assert!(format!("{err:#}").contains("Bakery"), "{err:#}");
    let suffix = Scenario::IncludeFertiliserInChain.output_suffix();
    assert!(!layout.primary_output(2002, suffix).exists());
    assert!(!layout.processed_output(2002, suffix).exists());
}

fn write_fabio_year(layout: &DataLayout, year: i32) {
    let products = LabelIndex::region_sector(vec![Label::pair("AUT", "Wheat"), Label::pair("DEU", "Flour")]).unwrap();
    let demand = LabelIndex::new(
        vec!["iso3c".into(), "final demand".into()],
        vec![
            Label::pair("AUT", "food"),
            Label::pair("DEU", "food"),
            Label::pair("DEU", "exports"),
        ],
    )
    .unwrap();
    let z = LabeledMatrix::from_rows(products.clone(), products.clone(), &[vec![0.0, 6.0], vec![0.0, 0.0]]).unwrap();
    let y = LabeledMatrix::from_rows(products, demand, &[vec![2.0, 0.0, 9.0], vec![0.0, 5.0, 9.0]]).unwrap();
    write_matrix(&layout.fabio_transactions(year), &z).unwrap();
    write_matrix(&layout.fabio_final_demand(year), &y).unwrap();
}

#[test]
fn biomass_year_writes_inverse_demand_and_regions() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_fabio_year(&layout, 2005);

    let report = biomass_year(2005, &layout, &BiomassSettings::default()).unwrap();
    // L, Y_iso3c, two regions, issue table
    assert_eq!(report.outputs.len(), 5);
    assert!(layout.biomass_inverse(2005, "incl_negatives").exists());

    let deu = read_matrix(&layout.biomass_footprint_dir(2005, "incl_negatives").join("DEU.tsv"), 2, 2).unwrap();
    // L[Wheat, Flour] = 6 / 5, scaled by DEU demand for Flour
    assert!((deu.get(&Label::pair("AUT", "Wheat"), &Label::pair("DEU", "Flour")).unwrap() - 6.0).abs() < 1e-9);
}

#[test]
fn biomass_tag_follows_negative_handling() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_fabio_year(&layout, 2006);
    let settings = BiomassSettings {
        options: BiomassOptions {
            exclude_negatives: true,
            ..BiomassOptions::default()
        },
        ..BiomassSettings::default()
    };
    biomass_year(2006, &layout, &settings).unwrap();
    assert!(layout.biomass_regional_demand(2006, "excl_negatives").exists());
}

fn write_text(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn fertiliser_energy_joins_filled_intensities() {
    let dir = tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    write_text(
        &layout.fertiliser_intensities(),
        "region,continent,subcontinent,fertiliser,energy_intensity\n\
         DEU,Europe,Western Europe,N,40\n\
         RoW,ROW,ROW,N,70\n",
    );
    write_text(&layout.fabio_regions(), "iso3c,area\nAUT,Austria\nBRA,Brazil\n");
    write_text(
        &layout.region_table(),
        "iso3,continent,subcontinent\nAUT,Europe,Western Europe\nBRA,America,South America\n",
    );
    write_text(
        &layout.fertiliser_use(),
        "\tyear\tiso3c\titem\tcomm_group\tgroup\tfertiliser\tfertiliser_use_corrected\n\
         0\t2016\tAUT\tWheat\tCereals\tPrimary crops\tN\t2\n\
         1\t2016\tBRA\tSoy\tOil crops\tPrimary crops\tN\t1\n\
         2\t2016\tXXX\tSoy\tOil crops\tPrimary crops\tN\t1\n",
    );

    // data year, so values are the observed or filled ones
    let report = fertiliser_energy(&layout, &TimeseriesSettings::default()).unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(report.unmatched, 1);
    assert!(report.diagnostics.has_issues());

    let text = fs::read_to_string(&report.output).unwrap();
    let aut = text.lines().find(|l| l.contains("AUT")).unwrap();
    assert!(aut.ends_with("\t40.0\t80.0"), "{aut}");
    let bra = text.lines().find(|l| l.contains("BRA")).unwrap();
    assert!(bra.ends_with("\t70.0\t70.0"), "{bra}");
}
