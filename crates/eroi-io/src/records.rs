//! Row-oriented tables (fertiliser data, region lookups, issue lists).

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use eroi_core::{RegionInfo, RegionTable};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Field delimiter inferred from the extension: tab for `.tsv`/`.txt`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}

/// Deserialize every row of a delimited file with a header line.
pub fn read_records<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().delimiter(delimiter).from_reader(file);
    let mut records = Vec::new();
    for (idx, row) in rdr.deserialize().enumerate() {
        let record: T = row.with_context(|| format!("parsing row {} of {}", idx + 1, path.display()))?;
        records.push(record);
    }
    debug!(path = %path.display(), rows = records.len(), "read records");
    Ok(records)
}

/// Serialize rows with a header line, creating parent directories.
pub fn write_records<T: Serialize>(path: &Path, records: &[T], delimiter: u8) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in records {
        wtr.serialize(record).context("writing record")?;
    }
    wtr.flush().context("flushing record writer")?;
    debug!(path = %path.display(), rows = records.len(), "wrote records");
    Ok(())
}

/// Region codes of the biomass tables (`iso3c` column; other columns ignored).
#[derive(Debug, Deserialize)]
struct RegionCode {
    iso3c: String,
}

pub fn read_region_codes(path: &Path) -> Result<Vec<String>> {
    let rows: Vec<RegionCode> = read_records(path, delimiter_for(path))?;
    let mut codes: Vec<String> = rows.into_iter().map(|r| r.iso3c).collect();
    codes.sort();
    codes.dedup();
    Ok(codes)
}

/// Region table from a file with `iso3`, `continent`, `subcontinent` columns.
pub fn read_region_table(path: &Path) -> Result<RegionTable> {
    let rows: Vec<RegionInfo> = read_records(path, delimiter_for(path))?;
    RegionTable::new(rows).with_context(|| format!("building region table from {}", path.display()))
}
