//! Biomass footprints from physical (mass) supply-use tables.
//!
//! ```text
//! x = Z · 1 + Y_r · 1          total output incl. aggregated final demand
//! A = Z · diag(x)⁻¹            non-finite → 0
//! L = (I − A)⁻¹                exact LU inverse after diagonal clipping
//! F_r = L · diag(Y[:, r])      footprint of region r
//! ```

use crate::leontief::{leontief_inverse_exact, ClippedCoefficient, LeontiefReport};
use eroi_core::{Axis, EroiError, EroiResult, Label, LabeledMatrix, REGION_LEVEL, SECTOR_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Name of the aggregated final-demand axis.
pub const REGION_COLUMN_NAME: &str = "iso3c";

pub const DEFAULT_FINAL_DEMAND_CATEGORIES: &[&str] = &[
    "balancing",
    "food",
    "losses",
    "other",
    "stock_addition",
    "tourist",
    "unspecified",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomassOptions {
    /// Final-demand categories (column level 1 of `Y`) that count as demand
    #[serde(default = "default_categories")]
    pub final_demand_categories: Vec<String>,
    /// Zero negative entries of the aggregated demand and of `L`
    #[serde(default)]
    pub exclude_negatives: bool,
}

fn default_categories() -> Vec<String> {
    DEFAULT_FINAL_DEMAND_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BiomassOptions {
    fn default() -> Self {
        Self {
            final_demand_categories: default_categories(),
            exclude_negatives: false,
        }
    }
}

impl BiomassOptions {
    /// `incl_negatives` or `excl_negatives`, used in persisted names.
    pub fn negatives_tag(&self) -> &'static str {
        if self.exclude_negatives {
            "excl_negatives"
        } else {
            "incl_negatives"
        }
    }
}

/// Keep the listed final-demand categories and sum them per region.
///
/// Returns the aggregated matrix and the number of negative entries
/// clipped (always zero unless `exclude_negatives`).
pub fn aggregate_final_demand(
    y: &LabeledMatrix,
    categories: &[String],
    exclude_negatives: bool,
) -> EroiResult<(LabeledMatrix, usize)> {
    let wanted: HashSet<&str> = categories.iter().map(String::as_str).collect();
    let kept = y
        .cols()
        .filter_level(SECTOR_LEVEL, |c| wanted.contains(c))?;
    let mut aggregated = y
        .select_cols(&kept)?
        .aggregate_cols(REGION_LEVEL, REGION_COLUMN_NAME)?;
    let clipped = if exclude_negatives {
        aggregated.clip_negative()
    } else {
        0
    };
    Ok((aggregated, clipped))
}

/// `A = Z / x` with `x = rowsum(Z) + rowsum(Y_region)`.
pub fn technical_coefficients(z: &LabeledMatrix, y_region: &LabeledMatrix) -> EroiResult<LabeledMatrix> {
    if !z.is_square() {
        return Err(EroiError::shape_mismatch(
            "transaction matrix",
            z.rows().describe(),
            z.cols().describe(),
        ));
    }
    if y_region.rows() != z.rows() {
        return Err(EroiError::shape_mismatch(
            "final demand rows",
            z.rows().describe(),
            y_region.rows().describe(),
        ));
    }
    let x: Vec<f64> = z
        .row_sums()
        .iter()
        .zip(y_region.row_sums())
        .map(|(z_sum, y_sum)| z_sum + y_sum)
        .collect();
    let mut a = z.divide_columns(&x)?;
    a.replace_non_finite();
    Ok(a)
}

/// Leontief inverse and regional demand of one biomass year.
#[derive(Debug, Clone)]
pub struct BiomassFootprint {
    pub l: LabeledMatrix,
    pub y_region: LabeledMatrix,
    pub report: LeontiefReport,
    pub negative_demand_clipped: usize,
    pub negative_inverse_clipped: usize,
}

impl BiomassFootprint {
    /// Diagonal coefficients `>= 1` found in `A`.
    pub fn diagonal_issues(&self) -> &[ClippedCoefficient] {
        &self.report.clipped
    }

    /// Region codes of the aggregated demand, in column order.
    pub fn regions(&self) -> Vec<String> {
        self.y_region.cols().unique_level_values(0)
    }

    /// `L · diag(Y[:, region])`.
    pub fn region_footprint(&self, region: &str) -> EroiResult<LabeledMatrix> {
        let j = self
            .y_region
            .cols()
            .require(&Label::single(region), Axis::Columns)?;
        let demand = self.y_region.column(j);
        Ok(LabeledMatrix::from_fn(
            self.l.rows().clone(),
            self.l.cols().clone(),
            |r, c| self.l.value(r, c) * demand[c],
        ))
    }
}

pub fn biomass_footprint(
    z: &LabeledMatrix,
    y: &LabeledMatrix,
    options: &BiomassOptions,
) -> EroiResult<BiomassFootprint> {
    let (y_region, negative_demand_clipped) = aggregate_final_demand(
        y,
        &options.final_demand_categories,
        options.exclude_negatives,
    )?;
    let a = technical_coefficients(z, &y_region)?;
    let (mut l, report) = leontief_inverse_exact(&a)?;
    let negative_inverse_clipped = if options.exclude_negatives {
        l.clip_negative()
    } else {
        0
    };
    debug!(
        products = l.nrows(),
        regions = y_region.ncols(),
        clipped = report.clipped_count(),
        "biomass inverse ready"
    );
    Ok(BiomassFootprint {
        l,
        y_region,
        report,
        negative_demand_clipped,
        negative_inverse_clipped,
    })
}
