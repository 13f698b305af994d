//! Tab-separated matrices with multi-level headers.
//!
//! Layout for `n` row levels and `m` column levels:
//!
//! ```text
//! region    <n-1 blanks>  AT     AT     DE  ...   one line per column level,
//! sector    <n-1 blanks>  Wheat  Sugar  Wheat     first cell = level name
//! region    sector        <blanks ...>            row level names (optional)
//! AT        Wheat         0.1    0.0    0.02      n label cells, then values
//! ```
//!
//! With a single column level the first line carries the row level names
//! directly (`region  sector  indout`). Empty value cells read as zero.

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use eroi_core::{Label, LabelIndex, LabeledMatrix};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Parse a labeled matrix from any reader.
pub fn parse_matrix<R: Read>(reader: R, row_levels: usize, col_levels: usize) -> Result<LabeledMatrix> {
    if row_levels == 0 || col_levels == 0 {
        bail!("matrix needs at least one row and one column level");
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let records: Vec<StringRecord> = rdr
        .records()
        .collect::<std::result::Result<_, _>>()
        .context("reading tab-separated records")?;
    if records.len() < col_levels {
        bail!(
            "expected {} header lines, found {}",
            col_levels,
            records.len()
        );
    }

    let header = &records[..col_levels];
    let ncols = header[0]
        .len()
        .checked_sub(row_levels)
        .ok_or_else(|| anyhow!("header has fewer cells than the {} row levels", row_levels))?;
    let col_labels: Vec<Label> = (0..ncols)
        .map(|j| Label::new(header.iter().map(|h| cell(h, row_levels + j).to_string())))
        .collect();

    let mut body = col_levels;
    let (col_names, mut row_names) = if col_levels == 1 {
        let names: Vec<String> = (0..row_levels).map(|i| cell(&header[0], i).to_string()).collect();
        (vec![String::new()], Some(names))
    } else {
        let names = header.iter().map(|h| cell(h, 0).to_string()).collect();
        (names, None)
    };
    if col_levels > 1 {
        if let Some(line) = records.get(body) {
            if is_index_names_line(line, &records[body + 1..], row_levels) {
                row_names = Some((0..row_levels).map(|i| cell(line, i).to_string()).collect());
                body += 1;
            }
        }
    }
    let row_names = row_names.unwrap_or_else(|| (0..row_levels).map(|i| format!("level_{i}")).collect());

    let mut row_labels = Vec::with_capacity(records.len() - body);
    let mut values = Vec::with_capacity(records.len() - body);
    for (line_no, record) in records[body..].iter().enumerate() {
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        row_labels.push(Label::new((0..row_levels).map(|i| cell(record, i).to_string())));
        let row = (0..ncols)
            .map(|j| parse_value(cell(record, row_levels + j)))
            .collect::<Result<Vec<f64>>>()
            .with_context(|| format!("parsing data line {}", line_no + body + 1))?;
        values.push(row);
    }

    let rows = LabelIndex::new(row_names, row_labels)?;
    let cols = LabelIndex::new(col_names, col_labels)?;
    Ok(LabeledMatrix::from_rows(rows, cols, &values)?)
}

/// Read a labeled matrix from a file.
pub fn read_matrix(path: &Path, row_levels: usize, col_levels: usize) -> Result<LabeledMatrix> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let matrix = parse_matrix(file, row_levels, col_levels)
        .with_context(|| format!("reading matrix {}", path.display()))?;
    debug!(path = %path.display(), shape = %matrix.shape(), "read matrix");
    Ok(matrix)
}

/// Serialize a labeled matrix in the layout [`parse_matrix`] reads.
pub fn format_matrix<W: Write>(writer: W, matrix: &LabeledMatrix) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(writer);
    let rows = matrix.rows();
    let cols = matrix.cols();
    let row_levels = rows.depth().max(1);

    if cols.depth() <= 1 {
        let mut line: Vec<String> = (0..row_levels)
            .map(|i| rows.names().get(i).cloned().unwrap_or_default())
            .collect();
        line.extend(cols.iter().map(|l| l.level(0).unwrap_or_default().to_string()));
        wtr.write_record(&line).context("writing header")?;
    } else {
        for level in 0..cols.depth() {
            let mut line = vec![cols.names()[level].clone()];
            line.extend(std::iter::repeat(String::new()).take(row_levels - 1));
            line.extend(cols.iter().map(|l| l.level(level).unwrap_or_default().to_string()));
            wtr.write_record(&line).context("writing header")?;
        }
        let mut names: Vec<String> = rows.names().to_vec();
        names.extend(std::iter::repeat(String::new()).take(cols.len()));
        wtr.write_record(&names).context("writing row level names")?;
    }

    for (i, label) in rows.iter().enumerate() {
        let mut line: Vec<String> = label.levels().to_vec();
        line.extend((0..matrix.ncols()).map(|j| matrix.value(i, j).to_string()));
        wtr.write_record(&line)
            .with_context(|| format!("writing row {}", label))?;
    }
    wtr.flush().context("flushing matrix writer")?;
    Ok(())
}

/// Write a labeled matrix, creating parent directories.
pub fn write_matrix(path: &Path, matrix: &LabeledMatrix) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    format_matrix(file, matrix).with_context(|| format!("writing matrix {}", path.display()))?;
    debug!(path = %path.display(), shape = %matrix.shape(), "wrote matrix");
    Ok(())
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// The line after the column headers names the row levels when its value
/// cells are blank and its first cell is not a level-0 value of the body.
/// A data row with all values blank keeps its region in later rows.
fn is_index_names_line(record: &StringRecord, rest: &[StringRecord], row_levels: usize) -> bool {
    let first = cell(record, 0).trim();
    !first.is_empty()
        && record.iter().skip(row_levels).all(|c| c.trim().is_empty())
        && !rest.iter().any(|r| cell(r, 0).trim() == first)
}

fn parse_value(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| anyhow!("invalid number '{}': {}", trimmed, e))
}
