pub mod job;
pub mod manifest;
pub mod pipeline;
pub mod runner;

pub use job::{jobs_for_years, BatchJobRecord, TaskKind, YearJob};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest};
pub use pipeline::{
    biomass_year, eroi_of_food_upstream, fertiliser_energy, BiomassSettings, FertiliserReport,
    PipelineSettings, UpstreamSettings, YearReport,
};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary};
