//! Extension intensities `S = F / x`.

use eroi_core::diagnostics::categories;
use eroi_core::{Axis, Diagnostics, EroiError, EroiResult, LabeledMatrix};

/// Row-label level name of energy carriers in the extension tables.
pub const PRODUCT_LEVEL_NAME: &str = "IEA_product";

/// Column of the total-output table holding gross output.
pub const OUTPUT_COLUMN: &str = "indout";

/// Total output per label of `labels`, read from the `column` column of `x`.
///
/// Fails with `LabelNotFound` when the column or any label is missing.
pub fn output_vector(
    x: &LabeledMatrix,
    column: &str,
    labels: &eroi_core::LabelIndex,
) -> EroiResult<Vec<f64>> {
    let j = (0..x.ncols())
        .find(|&j| x.cols().get(j).and_then(|l| l.level(0)) == Some(column))
        .ok_or_else(|| EroiError::label_not_found(Axis::Columns, column))?;
    labels
        .iter()
        .map(|label| x.rows().require(label, Axis::Rows).map(|i| x.value(i, j)))
        .collect()
}

/// Aggregate `F` by the first row level (energy carrier), divide each column
/// by total output, and set non-finite results to zero.
///
/// Sectors with zero output therefore get zero intensity. Replacements are
/// counted into the returned diagnostics.
pub fn extension_intensity(
    f: &LabeledMatrix,
    output: &[f64],
) -> EroiResult<(LabeledMatrix, Diagnostics)> {
    let f_agg = f.aggregate_rows(0, PRODUCT_LEVEL_NAME)?;
    let mut s = f_agg.divide_columns(output)?;
    let replaced = s.replace_non_finite();

    let mut diag = Diagnostics::new();
    if replaced > 0 {
        let zero_output = output.iter().filter(|v| **v == 0.0).count();
        diag.add_warning(
            categories::NUMERICAL,
            &format!(
                "{replaced} non-finite intensities set to zero ({zero_output} sectors with zero output)"
            ),
        );
    }
    Ok((s, diag))
}

/// Sum a perspective matrix over rows sharing an energy carrier.
pub fn aggregate_by_product(m: &LabeledMatrix) -> EroiResult<LabeledMatrix> {
    m.aggregate_rows(0, PRODUCT_LEVEL_NAME)
}
