//! # eroi-algo: Input-Output Allocation Algorithms
//!
//! Numerical stages of the EROI pipeline, operating on
//! [`eroi_core::LabeledMatrix`] values.
//!
//! ## Upstream Energy
//!
//! | Stage | Item | Role |
//! |-------|------|------|
//! | Partition | [`SectorPartition`], [`Scenario`] | target / cut / other sectors |
//! | Reduction | [`upstream::reduce`] | drop cut sectors and excluded demand |
//! | Inversion | [`leontief_inverse`] | `pinv(I − A)` with diagonal clipping |
//! | Demand | [`upstream::decompose_demand`] | direct, indirect and total demand |
//! | Projection | [`upstream::project_perspectives`] | final-consumer, target, producer views |
//!
//! [`upstream_impact`] runs all of them for one partition.
//!
//! ## Supporting Stages
//!
//! - [`intensity`]: extension intensities `S = F / x`
//! - [`biomass`]: mass-based footprints per consuming region
//! - [`fertiliser`]: geographic and temporal gap filling of fertiliser energy
//!
//! ## Example
//!
//! ```rust
//! use eroi_algo::{upstream_impact, IoSystem, SectorPartition, UpstreamOptions};
//! use eroi_core::{Label, LabelIndex, LabeledMatrix};
//!
//! let sectors = LabelIndex::region_sector(vec![
//!     Label::pair("R1", "Wheat"),
//!     Label::pair("R1", "Mill"),
//! ])?;
//! let demand = LabelIndex::region_sector(vec![Label::pair("R1", "Households")])?;
//! let carriers = LabelIndex::flat("IEA_product", ["Coal"])?;
//!
//! let a = LabeledMatrix::from_rows(sectors.clone(), sectors.clone(), &[
//!     vec![0.0, 0.2],
//!     vec![0.3, 0.0],
//! ])?;
//! let y = LabeledMatrix::from_rows(sectors.clone(), demand, &[vec![10.0], vec![5.0]])?;
//! let s = LabeledMatrix::from_rows(carriers, sectors, &[vec![2.0, 4.0]])?;
//!
//! let system = IoSystem::new(a, y, s)?;
//! let partition = SectorPartition::new("primary", vec!["Wheat".into()], vec![]);
//! let result = upstream_impact(&system, &partition, &UpstreamOptions::default())?;
//! assert_eq!(result.target_perspective.ncols(), 1);
//! # Ok::<(), eroi_core::EroiError>(())
//! ```

pub mod biomass;
pub mod fertiliser;
pub mod intensity;
pub mod leontief;
pub mod partition;
pub mod upstream;

pub use biomass::{biomass_footprint, BiomassFootprint, BiomassOptions};
pub use fertiliser::{
    energy_footprint, fill_missing_regions, fill_timeseries, ConsumptionRecord, FilledIntensity,
    FootprintRecord, IntensityRecord, IntensitySeries, TimeseriesSettings,
};
pub use intensity::{aggregate_by_product, extension_intensity};
pub use leontief::{leontief_inverse, leontief_inverse_exact, LeontiefReport};
pub use partition::{Scenario, ScenarioPartitions, SectorLists, SectorPartition};
pub use upstream::{upstream_impact, IoSystem, Perspective, UpstreamOptions, UpstreamResult};
