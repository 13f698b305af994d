//! Dense matrices tagged with label registries on both axes.
//!
//! Dense storage is used because Leontief inverses are dense: every
//! (region, sector) pair depends on every other one through some supply
//! chain. All binary operations check label alignment first and fail with
//! [`EroiError::ShapeMismatch`] instead of broadcasting or zero-filling.

use crate::error::{Axis, EroiError, EroiResult};
use crate::labels::{Label, LabelIndex};
use faer::Mat;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    rows: LabelIndex,
    cols: LabelIndex,
    data: Mat<f64>,
}

impl LabeledMatrix {
    pub fn new(rows: LabelIndex, cols: LabelIndex, data: Mat<f64>) -> EroiResult<Self> {
        if data.nrows() != rows.len() || data.ncols() != cols.len() {
            return Err(EroiError::shape_mismatch(
                "labeled matrix construction",
                format!("{}x{}", rows.len(), cols.len()),
                format!("{}x{}", data.nrows(), data.ncols()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: LabelIndex, cols: LabelIndex) -> Self {
        let data = Mat::zeros(rows.len(), cols.len());
        Self { rows, cols, data }
    }

    pub fn from_fn<F>(rows: LabelIndex, cols: LabelIndex, f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let data = Mat::from_fn(rows.len(), cols.len(), f);
        Self { rows, cols, data }
    }

    /// Build from row-major nested vectors.
    pub fn from_rows(rows: LabelIndex, cols: LabelIndex, values: &[Vec<f64>]) -> EroiResult<Self> {
        if values.len() != rows.len() {
            return Err(EroiError::shape_mismatch(
                "row count",
                rows.len(),
                values.len(),
            ));
        }
        if let Some(bad) = values.iter().find(|row| row.len() != cols.len()) {
            return Err(EroiError::shape_mismatch(
                "column count",
                cols.len(),
                bad.len(),
            ));
        }
        Ok(Self::from_fn(rows, cols, |i, j| values[i][j]))
    }

    /// Identity matrix over `labels`.
    pub fn identity(labels: &LabelIndex) -> Self {
        Self::from_fn(labels.clone(), labels.clone(), |i, j| {
            if i == j {
                1.0
            } else {
                0.0
            }
        })
    }

    pub fn rows(&self) -> &LabelIndex {
        &self.rows
    }

    pub fn cols(&self) -> &LabelIndex {
        &self.cols
    }

    pub fn data(&self) -> &Mat<f64> {
        &self.data
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn shape(&self) -> String {
        format!("{}x{}", self.nrows(), self.ncols())
    }

    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.data.read(i, j)
    }

    pub fn set_value(&mut self, i: usize, j: usize, value: f64) {
        self.data.write(i, j, value);
    }

    pub fn get(&self, row: &Label, col: &Label) -> EroiResult<f64> {
        let i = self.rows.require(row, Axis::Rows)?;
        let j = self.cols.require(col, Axis::Columns)?;
        Ok(self.data.read(i, j))
    }

    pub fn set(&mut self, row: &Label, col: &Label, value: f64) -> EroiResult<()> {
        let i = self.rows.require(row, Axis::Rows)?;
        let j = self.cols.require(col, Axis::Columns)?;
        self.data.write(i, j, value);
        Ok(())
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.data.read(i, j)).collect()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.data.read(i, j)).collect()
    }

    /// Sub-matrix with the given row and column labels, in their order.
    pub fn select(&self, rows: &LabelIndex, cols: &LabelIndex) -> EroiResult<Self> {
        let row_pos = positions(&self.rows, rows, Axis::Rows)?;
        let col_pos = positions(&self.cols, cols, Axis::Columns)?;
        Ok(Self::from_fn(rows.clone(), cols.clone(), |i, j| {
            self.data.read(row_pos[i], col_pos[j])
        }))
    }

    pub fn select_rows(&self, rows: &LabelIndex) -> EroiResult<Self> {
        self.select(rows, &self.cols)
    }

    pub fn select_cols(&self, cols: &LabelIndex) -> EroiResult<Self> {
        self.select(&self.rows, cols)
    }

    /// Remove every label whose sector is in `sectors` from one axis.
    pub fn drop_sectors(&self, axis: Axis, sectors: &HashSet<String>) -> EroiResult<Self> {
        match axis {
            Axis::Rows => self.select_rows(&self.rows.drop_sectors(sectors)?),
            Axis::Columns => self.select_cols(&self.cols.drop_sectors(sectors)?),
        }
    }

    /// Remove columns whose `level` value is in `values`.
    pub fn drop_columns_where(&self, level: usize, values: &HashSet<String>) -> EroiResult<Self> {
        let kept = self.cols.filter_level(level, |v| !values.contains(v))?;
        self.select_cols(&kept)
    }

    /// Matrix product. Column labels of `self` must equal row labels of `rhs`.
    pub fn matmul(&self, rhs: &LabeledMatrix) -> EroiResult<Self> {
        if self.cols != rhs.rows {
            return Err(EroiError::shape_mismatch(
                "matrix product",
                self.cols.describe(),
                rhs.rows.describe(),
            ));
        }
        let data = &self.data * &rhs.data;
        Ok(Self {
            rows: self.rows.clone(),
            cols: rhs.cols.clone(),
            data,
        })
    }

    /// Element-wise sum; both axes must carry identical labels.
    pub fn add(&self, rhs: &LabeledMatrix) -> EroiResult<Self> {
        self.check_aligned(rhs, "matrix sum")?;
        Ok(Self::from_fn(self.rows.clone(), self.cols.clone(), |i, j| {
            self.data.read(i, j) + rhs.data.read(i, j)
        }))
    }

    /// Element-wise difference; both axes must carry identical labels.
    pub fn sub(&self, rhs: &LabeledMatrix) -> EroiResult<Self> {
        self.check_aligned(rhs, "matrix difference")?;
        Ok(Self::from_fn(self.rows.clone(), self.cols.clone(), |i, j| {
            self.data.read(i, j) - rhs.data.read(i, j)
        }))
    }

    fn check_aligned(&self, rhs: &LabeledMatrix, context: &str) -> EroiResult<()> {
        if self.rows != rhs.rows {
            return Err(EroiError::shape_mismatch(
                format!("{context} (rows)"),
                self.rows.describe(),
                rhs.rows.describe(),
            ));
        }
        if self.cols != rhs.cols {
            return Err(EroiError::shape_mismatch(
                format!("{context} (columns)"),
                self.cols.describe(),
                rhs.cols.describe(),
            ));
        }
        Ok(())
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.nrows())
            .map(|i| (0..self.ncols()).map(|j| self.data.read(i, j)).sum())
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.row_sums().iter().sum()
    }

    /// `diag(row-sums(self))`, labeled by the row labels on both axes.
    pub fn diag_of_row_sums(&self) -> Self {
        let sums = self.row_sums();
        Self::from_fn(self.rows.clone(), self.rows.clone(), |i, j| {
            if i == j {
                sums[i]
            } else {
                0.0
            }
        })
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self::from_fn(self.rows.clone(), self.cols.clone(), |i, j| {
            f(self.data.read(i, j))
        })
    }

    /// Set negative entries to zero. Returns how many were changed.
    pub fn clip_negative(&mut self) -> usize {
        self.replace_where(|v| v < 0.0)
    }

    /// Set NaN and infinite entries to zero. Returns how many were changed.
    pub fn replace_non_finite(&mut self) -> usize {
        self.replace_where(|v| !v.is_finite())
    }

    fn replace_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(f64) -> bool,
    {
        let mut count = 0;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                if pred(self.data.read(i, j)) {
                    self.data.write(i, j, 0.0);
                    count += 1;
                }
            }
        }
        count
    }

    pub fn is_finite(&self) -> bool {
        (0..self.ncols()).all(|j| (0..self.nrows()).all(|i| self.data.read(i, j).is_finite()))
    }

    /// Divide each column by `divisors[j]` (no guard; see callers).
    pub fn divide_columns(&self, divisors: &[f64]) -> EroiResult<Self> {
        if divisors.len() != self.ncols() {
            return Err(EroiError::shape_mismatch(
                "column divisors",
                self.ncols(),
                divisors.len(),
            ));
        }
        Ok(Self::from_fn(self.rows.clone(), self.cols.clone(), |i, j| {
            self.data.read(i, j) / divisors[j]
        }))
    }

    /// Sum rows sharing the same value at `level`. The result has
    /// single-level row labels named `name`, in first-seen order.
    pub fn aggregate_rows(&self, level: usize, name: &str) -> EroiResult<Self> {
        let (groups, index) = group_positions(&self.rows, level, name, Axis::Rows)?;
        let mut out = Self::zeros(index, self.cols.clone());
        for (i, g) in groups.iter().enumerate() {
            for j in 0..self.ncols() {
                let current = out.data.read(*g, j);
                out.data.write(*g, j, current + self.data.read(i, j));
            }
        }
        Ok(out)
    }

    /// Sum columns sharing the same value at `level`.
    pub fn aggregate_cols(&self, level: usize, name: &str) -> EroiResult<Self> {
        let (groups, index) = group_positions(&self.cols, level, name, Axis::Columns)?;
        let mut out = Self::zeros(self.rows.clone(), index);
        for (j, g) in groups.iter().enumerate() {
            for i in 0..self.nrows() {
                let current = out.data.read(i, *g);
                out.data.write(i, *g, current + self.data.read(i, j));
            }
        }
        Ok(out)
    }

    /// Largest absolute element-wise difference to an aligned matrix.
    pub fn max_abs_diff(&self, rhs: &LabeledMatrix) -> EroiResult<f64> {
        self.check_aligned(rhs, "matrix comparison")?;
        let mut max = 0.0_f64;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                max = max.max((self.data.read(i, j) - rhs.data.read(i, j)).abs());
            }
        }
        Ok(max)
    }
}

fn positions(source: &LabelIndex, wanted: &LabelIndex, axis: Axis) -> EroiResult<Vec<usize>> {
    wanted.iter().map(|l| source.require(l, axis)).collect()
}

fn group_positions(
    index: &LabelIndex,
    level: usize,
    name: &str,
    axis: Axis,
) -> EroiResult<(Vec<usize>, LabelIndex)> {
    let mut keys: Vec<String> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    let mut groups = Vec::with_capacity(index.len());
    for label in index.iter() {
        let key = label
            .level(level)
            .ok_or_else(|| EroiError::label_not_found(axis, format!("level {level} of {label}")))?;
        let next = keys.len();
        let g = *lookup.entry(key.to_string()).or_insert_with(|| {
            keys.push(key.to_string());
            next
        });
        groups.push(g);
    }
    let index = LabelIndex::flat(name, keys)?;
    Ok((groups, index))
}
