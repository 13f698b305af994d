//! Directory layout of the pipeline's data tree.

use std::path::{Path, PathBuf};

/// Paths of every input and output relative to one data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `EXIOBASE/IOT_txt/pxp/IOT_{year}_pxp`
    pub fn exiobase_iot_dir(&self, year: i32) -> PathBuf {
        self.root
            .join("EXIOBASE")
            .join("IOT_txt")
            .join("pxp")
            .join(format!("IOT_{year}_pxp"))
    }

    pub fn technical_coefficients(&self, year: i32) -> PathBuf {
        self.exiobase_iot_dir(year).join("A.txt")
    }

    pub fn final_demand(&self, year: i32) -> PathBuf {
        self.exiobase_iot_dir(year).join("Y.txt")
    }

    pub fn total_output(&self, year: i32) -> PathBuf {
        self.exiobase_iot_dir(year).join("x.txt")
    }

    pub fn energy_extension(&self, year: i32) -> PathBuf {
        self.root
            .join("EXIOBASE")
            .join("Extensions")
            .join("energy")
            .join("pxp")
            .join(format!("IOT_{year}_pxp"))
            .join("net_energy_use.tsv")
    }

    /// `interim/upstream_energy_use/unallocated/{year}/target_perspective`
    pub fn upstream_output_dir(&self, year: i32) -> PathBuf {
        self.root
            .join("interim")
            .join("upstream_energy_use")
            .join("unallocated")
            .join(year.to_string())
            .join("target_perspective")
    }

    pub fn primary_output(&self, year: i32, suffix: &str) -> PathBuf {
        self.upstream_output_dir(year)
            .join(format!("primary_crops_product{suffix}.tsv"))
    }

    pub fn processed_output(&self, year: i32, suffix: &str) -> PathBuf {
        self.upstream_output_dir(year)
            .join(format!("processed_food_product{suffix}.tsv"))
    }

    pub fn fabio_dir(&self) -> PathBuf {
        self.root.join("raw").join("FABIO").join("biomass")
    }

    pub fn fabio_transactions(&self, year: i32) -> PathBuf {
        self.fabio_dir().join(format!("Z_mass_{year}.tsv"))
    }

    pub fn fabio_final_demand(&self, year: i32) -> PathBuf {
        self.fabio_dir().join(format!("Y_{year}.tsv"))
    }

    pub fn fabio_regions(&self) -> PathBuf {
        self.fabio_dir().join("regions.csv")
    }

    /// `L_{year}_mass_{tag}.tsv`, tag being `incl_negatives` or `excl_negatives`
    pub fn biomass_inverse(&self, year: i32, tag: &str) -> PathBuf {
        self.fabio_dir().join(format!("L_{year}_mass_{tag}.tsv"))
    }

    pub fn biomass_regional_demand(&self, year: i32, tag: &str) -> PathBuf {
        self.fabio_dir().join(format!("Y_iso3c_{year}_{tag}.tsv"))
    }

    pub fn biomass_footprint_dir(&self, year: i32, tag: &str) -> PathBuf {
        self.root
            .join("interim")
            .join("biomass_footprint")
            .join(tag)
            .join(year.to_string())
    }

    pub fn fertiliser_dir(&self) -> PathBuf {
        self.root.join("interim").join("fertiliser")
    }

    pub fn fertiliser_use(&self) -> PathBuf {
        self.fertiliser_dir().join("use").join("fertiliser_use_reduced.csv")
    }

    pub fn fertiliser_intensities(&self) -> PathBuf {
        self.fertiliser_dir().join("lci").join("energy_intensity.csv")
    }

    pub fn fertiliser_footprint(&self) -> PathBuf {
        self.fertiliser_dir()
            .join("energy_footprint")
            .join("all_years.tsv")
    }

    pub fn region_table(&self) -> PathBuf {
        self.root.join("raw").join("regions.csv")
    }
}
