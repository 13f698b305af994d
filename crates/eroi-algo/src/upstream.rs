//! Upstream energy allocation on a partitioned input-output economy.
//!
//! ## Partition
//!
//! Cut sectors are removed from the economy (rows and columns of `A`, rows of
//! `Y`, columns of `S`). The surviving labels split into target sectors `t`
//! and other sectors `o`:
//!
//! ```text
//!       ┌ A_tt  A_to ┐        ┌ Y_t ┐
//!   A = │            │    Y = │     │
//!       └ A_ot  A_oo ┘        └ Y_o ┘
//! ```
//!
//! `A_to[t, o]` is the input from target sector `t` per unit output of other
//! sector `o`.
//!
//! ## Demand on target sectors
//!
//! ```text
//! L_oo      = (I − A_oo)⁺              supply chains that bypass target sectors
//! indirect  = A_to · L_oo · Y_o        target inputs into other sectors' final demand
//! direct    = Y_t
//! total     = direct + indirect
//! ```
//!
//! ## Perspectives
//!
//! With `L = (I − A)⁺` over the reduced economy and `L_·t` its target columns:
//!
//! ```text
//! production      = L_·t · total
//! final consumer  = S · production                  (energy × demand column)
//! target          = S · L_·t · diag(total · 1)      (energy × target sector)
//! producer        = S · diag(production · 1)        (energy × producing sector)
//! ```
//!
//! The three views answer different attribution questions and must not be
//! summed or averaged. Summed over their column axis, final-consumer and
//! target perspectives give the same per-carrier totals.

use crate::leontief::{leontief_inverse, LeontiefReport};
use crate::partition::{ResolvedPartition, SectorPartition};
use eroi_core::{Axis, Diagnostics, EroiError, EroiResult, LabeledMatrix, SECTOR_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Final-demand category dropped by default: exports are re-counted as
/// demand of the importing region.
pub const EXPORTS_CATEGORY: &str = "Exports: Total (fob)";

/// Technical coefficients, final demand and extension intensities of one year.
#[derive(Debug, Clone)]
pub struct IoSystem {
    pub a: LabeledMatrix,
    pub y: LabeledMatrix,
    pub s: LabeledMatrix,
}

impl IoSystem {
    /// Check that `A` is square and that `Y` rows and `S` columns share its labels.
    pub fn new(a: LabeledMatrix, y: LabeledMatrix, s: LabeledMatrix) -> EroiResult<Self> {
        if !a.is_square() {
            return Err(EroiError::shape_mismatch(
                "technical coefficients",
                a.rows().describe(),
                a.cols().describe(),
            ));
        }
        if y.rows() != a.rows() {
            return Err(EroiError::shape_mismatch(
                "final demand rows",
                a.rows().describe(),
                y.rows().describe(),
            ));
        }
        if s.cols() != a.cols() {
            return Err(EroiError::shape_mismatch(
                "extension columns",
                a.cols().describe(),
                s.cols().describe(),
            ));
        }
        Ok(Self { a, y, s })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamOptions {
    /// Clip negative final demand (e.g. stock drawdown) to zero
    #[serde(default)]
    pub remove_negative_demand: bool,
    /// Final-demand categories (column level 1 of `Y`) left out
    #[serde(default = "default_excluded_categories")]
    pub excluded_demand_categories: Vec<String>,
}

fn default_excluded_categories() -> Vec<String> {
    vec![EXPORTS_CATEGORY.to_string()]
}

impl Default for UpstreamOptions {
    fn default() -> Self {
        Self {
            remove_negative_demand: false,
            excluded_demand_categories: default_excluded_categories(),
        }
    }
}

/// `A`, `Y`, `S` with cut sectors removed, plus the partition labels.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub a: LabeledMatrix,
    pub y: LabeledMatrix,
    pub s: LabeledMatrix,
    pub partition: ResolvedPartition,
    /// Number of negative final-demand entries clipped to zero
    pub negative_demand_clipped: usize,
}

/// Remove cut sectors and excluded demand categories (copies; inputs untouched).
pub fn reduce(
    system: &IoSystem,
    partition: &SectorPartition,
    options: &UpstreamOptions,
) -> EroiResult<ReducedSystem> {
    let resolved = partition.resolve(system.a.rows())?;
    let cut = partition.cut_set();

    let a = system.a.select(&resolved.kept, &resolved.kept)?;
    let excluded: HashSet<String> = options.excluded_demand_categories.iter().cloned().collect();
    let mut y = system
        .y
        .drop_sectors(Axis::Rows, &cut)?
        .drop_columns_where(SECTOR_LEVEL, &excluded)?;
    let negative_demand_clipped = if options.remove_negative_demand {
        y.clip_negative()
    } else {
        0
    };
    let s = system.s.drop_sectors(Axis::Columns, &cut)?;

    Ok(ReducedSystem {
        a,
        y,
        s,
        partition: resolved,
        negative_demand_clipped,
    })
}

/// Direct, indirect and total final demand placed on target sectors.
#[derive(Debug, Clone)]
pub struct DemandDecomposition {
    pub direct: LabeledMatrix,
    pub indirect: LabeledMatrix,
    pub total: LabeledMatrix,
}

/// `indirect = A_to · (L_oo · Y_o)`, `total = Y_t + indirect`.
///
/// `indirect` must carry exactly the labels of `direct`; anything else is
/// a `ShapeMismatch`.
pub fn decompose_demand(
    a_target_other: &LabeledMatrix,
    l_other_other: &LabeledMatrix,
    y_other_all: &LabeledMatrix,
    y_target_all: &LabeledMatrix,
) -> EroiResult<DemandDecomposition> {
    let indirect = a_target_other.matmul(&l_other_other.matmul(y_other_all)?)?;
    let direct = y_target_all.clone();
    let total = direct.add(&indirect)?;
    Ok(DemandDecomposition {
        direct,
        indirect,
        total,
    })
}

/// The three attribution views plus the production they are built from.
#[derive(Debug, Clone)]
pub struct Perspectives {
    pub final_consumer: LabeledMatrix,
    pub target: LabeledMatrix,
    pub producer: LabeledMatrix,
    pub upstream_production: LabeledMatrix,
}

pub fn project_perspectives(
    l_all_target: &LabeledMatrix,
    total_demand: &LabeledMatrix,
    s: &LabeledMatrix,
) -> EroiResult<Perspectives> {
    let upstream_production = l_all_target.matmul(total_demand)?;
    let final_consumer = s.matmul(&upstream_production)?;
    let target = s.matmul(&l_all_target.matmul(&total_demand.diag_of_row_sums())?)?;
    let producer = s.matmul(&upstream_production.diag_of_row_sums())?;
    Ok(Perspectives {
        final_consumer,
        target,
        producer,
        upstream_production,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Perspective {
    FinalConsumer,
    Target,
    Producer,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::FinalConsumer => "final_consumer_perspective",
            Perspective::Target => "target_perspective",
            Perspective::Producer => "producer_perspective",
        }
    }
}

/// Everything `upstream_impact` computes. No hidden state.
#[derive(Debug, Clone)]
pub struct UpstreamResult {
    pub partition: String,
    pub final_consumer_perspective: LabeledMatrix,
    pub target_perspective: LabeledMatrix,
    pub producer_perspective: LabeledMatrix,
    pub indirect_demand: LabeledMatrix,
    pub direct_demand: LabeledMatrix,
    pub upstream_production: LabeledMatrix,
    /// Clipping report of the inversion over the reduced economy
    pub full_inverse: LeontiefReport,
    /// Clipping report of the other-sectors-only inversion
    pub other_inverse: LeontiefReport,
    pub negative_demand_clipped: usize,
}

impl UpstreamResult {
    pub fn perspective(&self, perspective: Perspective) -> &LabeledMatrix {
        match perspective {
            Perspective::FinalConsumer => &self.final_consumer_perspective,
            Perspective::Target => &self.target_perspective,
            Perspective::Producer => &self.producer_perspective,
        }
    }

    pub fn total_demand(&self) -> EroiResult<LabeledMatrix> {
        self.direct_demand.add(&self.indirect_demand)
    }

    pub fn clipped_count(&self) -> usize {
        self.full_inverse.clipped_count() + self.other_inverse.clipped_count()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut diag = self
            .full_inverse
            .to_diagnostics(&format!("{} partition, full economy", self.partition));
        diag.merge(
            self.other_inverse
                .to_diagnostics(&format!("{} partition, other sectors", self.partition)),
        );
        diag
    }
}

/// Upstream energy of the target sectors of `partition`.
///
/// Fails before any algebra when the partition is invalid (`Config`) or
/// names sectors absent from `A` (`LabelNotFound`).
pub fn upstream_impact(
    system: &IoSystem,
    partition: &SectorPartition,
    options: &UpstreamOptions,
) -> EroiResult<UpstreamResult> {
    partition.validate()?;
    let reduced = reduce(system, partition, options)?;
    let ResolvedPartition {
        kept,
        target,
        other,
    } = &reduced.partition;
    debug!(
        partition = %partition.name,
        kept = kept.len(),
        target = target.len(),
        other = other.len(),
        "partitioned economy"
    );

    let (l_modified, full_inverse) = leontief_inverse(&reduced.a)?;
    let l_all_target = l_modified.select_cols(target)?;

    let a_other_other = reduced.a.select(other, other)?;
    let (l_other_other, other_inverse) = leontief_inverse(&a_other_other)?;

    let a_target_other = reduced.a.select(target, other)?;
    let y_target_all = reduced.y.select_rows(target)?;
    let y_other_all = reduced.y.select_rows(other)?;

    let demand = decompose_demand(&a_target_other, &l_other_other, &y_other_all, &y_target_all)?;
    let views = project_perspectives(&l_all_target, &demand.total, &reduced.s)?;

    Ok(UpstreamResult {
        partition: partition.name.clone(),
        final_consumer_perspective: views.final_consumer,
        target_perspective: views.target,
        producer_perspective: views.producer,
        indirect_demand: demand.indirect,
        direct_demand: demand.direct,
        upstream_production: views.upstream_production,
        full_inverse,
        other_inverse,
        negative_demand_clipped: reduced.negative_demand_clipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eroi_core::{Label, LabelIndex};

    fn sectors(names: &[&str]) -> LabelIndex {
        LabelIndex::region_sector(names.iter().map(|s| Label::pair("R1", *s)).collect()).unwrap()
    }

    fn demand_cols(categories: &[&str]) -> LabelIndex {
        LabelIndex::new(
            vec!["region".into(), "category".into()],
            categories.iter().map(|c| Label::pair("R1", *c)).collect(),
        )
        .unwrap()
    }

    fn carriers(names: &[&str]) -> LabelIndex {
        LabelIndex::flat("IEA_product", names.iter().copied()).unwrap()
    }

    fn toy_system(s: &[f64]) -> IoSystem {
        let labels = sectors(&["s1", "s2"]);
        let a = LabeledMatrix::from_rows(labels.clone(), labels.clone(), &[
            vec![0.0, 0.2],
            vec![0.3, 0.0],
        ])
        .unwrap();
        let y = LabeledMatrix::from_rows(labels.clone(), demand_cols(&["Households"]), &[
            vec![10.0],
            vec![5.0],
        ])
        .unwrap();
        let s = LabeledMatrix::from_rows(carriers(&["Coal"]), labels, &[s.to_vec()]).unwrap();
        IoSystem::new(a, y, s).unwrap()
    }

    fn target(names: &[&str]) -> SectorPartition {
        SectorPartition::new("test", names.iter().map(|s| s.to_string()).collect(), Vec::new())
    }

    #[test]
    fn toy_economy_matches_hand_inversion() {
        let system = toy_system(&[2.0, 4.0]);
        let result = upstream_impact(&system, &target(&["s1"]), &UpstreamOptions::default()).unwrap();

        // indirect = A[s1,s2] * (1 - A[s2,s2])^-1 * Y[s2] = 0.2 * 5
        assert!((result.indirect_demand.value(0, 0) - 1.0).abs() < 1e-12);
        assert_eq!(result.direct_demand.value(0, 0), 10.0);

        // L[:, s1] = [1, 0.3] / (1 - 0.2 * 0.3)
        let det = 0.94;
        let production = [11.0 / det, 3.3 / det];
        assert!((result.upstream_production.value(0, 0) - production[0]).abs() < 1e-9);
        assert!((result.upstream_production.value(1, 0) - production[1]).abs() < 1e-9);

        let expected = 2.0 * production[0] + 4.0 * production[1];
        assert!((result.target_perspective.value(0, 0) - expected).abs() < 1e-9);
        assert_eq!(result.target_perspective.ncols(), 1);
    }

    #[test]
    fn excluded_categories_are_dropped_when_present() {
        let labels = sectors(&["s1", "s2"]);
        let a = LabeledMatrix::zeros(labels.clone(), labels.clone());
        let y = LabeledMatrix::from_rows(
            labels.clone(),
            demand_cols(&["Households", EXPORTS_CATEGORY]),
            &[vec![1.0, 100.0], vec![1.0, 100.0]],
        )
        .unwrap();
        let s = LabeledMatrix::from_rows(carriers(&["Coal"]), labels, &[vec![1.0, 1.0]]).unwrap();
        let system = IoSystem::new(a, y, s).unwrap();
        let result = upstream_impact(&system, &target(&["s1"]), &UpstreamOptions::default()).unwrap();
        assert_eq!(result.direct_demand.ncols(), 1);
        assert_eq!(result.target_perspective.value(0, 0), 1.0);
    }

    #[test]
    fn negative_demand_clipping_is_opt_in() {
        let labels = sectors(&["s1", "s2"]);
        let a = LabeledMatrix::zeros(labels.clone(), labels.clone());
        let y = LabeledMatrix::from_rows(labels.clone(), demand_cols(&["Stock"]), &[
            vec![-4.0],
            vec![2.0],
        ])
        .unwrap();
        let s = LabeledMatrix::from_rows(carriers(&["Coal"]), labels, &[vec![1.0, 1.0]]).unwrap();
        let system = IoSystem::new(a, y, s).unwrap();

        let kept = upstream_impact(&system, &target(&["s1"]), &UpstreamOptions::default()).unwrap();
        assert_eq!(kept.direct_demand.value(0, 0), -4.0);

        let options = UpstreamOptions {
            remove_negative_demand: true,
            ..UpstreamOptions::default()
        };
        let clipped = upstream_impact(&system, &target(&["s1"]), &options).unwrap();
        assert_eq!(clipped.direct_demand.value(0, 0), 0.0);
        assert_eq!(clipped.negative_demand_clipped, 1);
        assert_eq!(system.y.value(0, 0), -4.0);
    }

    #[test]
    fn mismatched_extension_is_rejected() {
        let labels = sectors(&["s1", "s2"]);
        let a = LabeledMatrix::zeros(labels.clone(), labels.clone());
        let y = LabeledMatrix::zeros(labels, demand_cols(&["Households"]));
        let s = LabeledMatrix::zeros(carriers(&["Coal"]), sectors(&["s1"]));
        assert!(matches!(
            IoSystem::new(a, y, s),
            Err(EroiError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn decompose_demand_rejects_misaligned_indirect_demand() {
        let t = sectors(&["s1"]);
        let o = sectors(&["s2"]);
        let a_to = LabeledMatrix::zeros(t.clone(), o.clone());
        let l_oo = LabeledMatrix::identity(&o);
        let y_o = LabeledMatrix::zeros(o, demand_cols(&["Households"]));
        let y_t = LabeledMatrix::zeros(t, demand_cols(&["Government"]));
        assert!(matches!(
            decompose_demand(&a_to, &l_oo, &y_o, &y_t),
            Err(EroiError::ShapeMismatch { .. })
        ));
    }
}
