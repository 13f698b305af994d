//! Leontief inverses of technical-coefficient matrices.
//!
//! ```text
//! L = (I − A)⁺
//! ```
//!
//! Physical-flow accounts occasionally report a sector consuming 100% or
//! more of its own output (`A[i,i] >= 1`). Such coefficients make `I − A`
//! singular or give it a negative diagonal, so before inversion they are
//! replaced by `1 − 1e-10`. Every replacement is returned in a
//! [`LeontiefReport`] and logged; the anomaly belongs to the input data.
//!
//! The upstream engine inverts with a Moore–Penrose pseudo-inverse
//! ([`pseudo_inverse`], SVD based) so near-singular systems still yield a
//! finite answer. The biomass stage uses an exact LU inverse
//! ([`leontief_inverse_exact`]).

use eroi_core::diagnostics::categories;
use eroi_core::{Diagnostics, EroiError, EroiResult, LabeledMatrix};
use faer::prelude::*;
use faer::Mat;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Replacement for diagonal coefficients at or above one.
pub const DIAGONAL_CEILING: f64 = 1.0 - 1e-10;

/// Relative cutoff for small singular values (NumPy's `pinv` default).
pub const DEFAULT_RCOND: f64 = 1e-15;

/// A diagonal coefficient that was replaced before inversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippedCoefficient {
    pub label: String,
    pub original: f64,
}

/// Data-quality report produced alongside an inverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeontiefReport {
    pub clipped: Vec<ClippedCoefficient>,
}

impl LeontiefReport {
    pub fn clipped_count(&self) -> usize {
        self.clipped.len()
    }

    /// One data-quality warning per clipped coefficient.
    pub fn to_diagnostics(&self, context: &str) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for c in &self.clipped {
            diag.add_warning_with_entity(
                categories::DATA_QUALITY,
                &format!(
                    "{context}: diagonal coefficient {} replaced by {}",
                    c.original, DIAGONAL_CEILING
                ),
                &c.label,
            );
        }
        diag
    }
}

/// Replace diagonal entries `>= 1` with [`DIAGONAL_CEILING`].
pub fn clip_diagonal(a: &LabeledMatrix) -> EroiResult<(LabeledMatrix, Vec<ClippedCoefficient>)> {
    require_square(a, "diagonal clipping")?;
    let mut clipped = a.clone();
    let mut records = Vec::new();
    for i in 0..a.nrows() {
        let value = a.value(i, i);
        if value >= 1.0 {
            clipped.set_value(i, i, DIAGONAL_CEILING);
            let label = a
                .rows()
                .get(i)
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("#{i}"));
            records.push(ClippedCoefficient {
                label,
                original: value,
            });
        }
    }
    Ok((clipped, records))
}

/// Moore–Penrose pseudo-inverse via thin SVD.
///
/// Singular values at or below `rcond * σ_max` are treated as zero. Fails
/// with [`EroiError::SingularMatrix`] when the input or the result is not
/// finite.
pub fn pseudo_inverse(m: &Mat<f64>, rcond: f64) -> EroiResult<Mat<f64>> {
    let (nrows, ncols) = (m.nrows(), m.ncols());
    if nrows == 0 || ncols == 0 {
        return Ok(Mat::zeros(ncols, nrows));
    }
    for j in 0..ncols {
        for i in 0..nrows {
            if !m.read(i, j).is_finite() {
                return Err(EroiError::SingularMatrix(format!(
                    "non-finite entry at ({i}, {j}) before pseudo-inversion"
                )));
            }
        }
    }

    let svd = m.thin_svd();
    let u = svd.u();
    let v = svd.v();
    let s = svd.s_diagonal();
    let k = s.nrows();

    let s_max = (0..k).map(|i| s.read(i, 0)).fold(0.0_f64, f64::max);
    let cutoff = rcond * s_max;
    let inv_s: Vec<f64> = (0..k)
        .map(|i| {
            let sigma = s.read(i, 0);
            if sigma > cutoff {
                1.0 / sigma
            } else {
                0.0
            }
        })
        .collect();

    // A⁺ = V · Σ⁺ · Uᵀ
    let v_scaled = Mat::from_fn(ncols, k, |i, j| v.read(i, j) * inv_s[j]);
    let u_t = u.transpose().to_owned();
    let pinv = &v_scaled * &u_t;

    for j in 0..pinv.ncols() {
        for i in 0..pinv.nrows() {
            if !pinv.read(i, j).is_finite() {
                return Err(EroiError::SingularMatrix(
                    "pseudo-inverse did not converge to a finite result".into(),
                ));
            }
        }
    }
    Ok(pinv)
}

/// `pinv(I − A)` after diagonal clipping, labeled like `A`.
pub fn leontief_inverse(a: &LabeledMatrix) -> EroiResult<(LabeledMatrix, LeontiefReport)> {
    let (clipped, records) = clip_diagonal(a)?;
    log_clipped(&records);
    let i_minus_a = LabeledMatrix::identity(a.rows()).sub(&clipped)?;
    let inverse = pseudo_inverse(i_minus_a.data(), DEFAULT_RCOND)?;
    let l = LabeledMatrix::new(a.rows().clone(), a.cols().clone(), inverse)?;
    Ok((l, LeontiefReport { clipped: records }))
}

/// `(I − A)⁻¹` via LU with partial pivoting, after diagonal clipping.
pub fn leontief_inverse_exact(a: &LabeledMatrix) -> EroiResult<(LabeledMatrix, LeontiefReport)> {
    let (clipped, records) = clip_diagonal(a)?;
    log_clipped(&records);
    let i_minus_a = LabeledMatrix::identity(a.rows()).sub(&clipped)?;
    let n = a.nrows();
    let identity = Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 });
    let lu = i_minus_a.data().partial_piv_lu();
    let inverse = lu.solve(&identity);
    let l = LabeledMatrix::new(a.rows().clone(), a.cols().clone(), inverse)?;
    if !l.is_finite() {
        return Err(EroiError::SingularMatrix(
            "LU inverse of I - A has non-finite entries".into(),
        ));
    }
    Ok((l, LeontiefReport { clipped: records }))
}

fn require_square(a: &LabeledMatrix, context: &str) -> EroiResult<()> {
    if !a.is_square() {
        return Err(EroiError::shape_mismatch(
            context,
            a.rows().describe(),
            a.cols().describe(),
        ));
    }
    Ok(())
}

fn log_clipped(records: &[ClippedCoefficient]) {
    for c in records {
        warn!(
            label = %c.label,
            original = c.original,
            "diagonal technical coefficient >= 1 replaced before inversion"
        );
    }
}
