//! Energy embodied in fertiliser use.
//!
//! Life-cycle inventories give cumulative energy demand per kg of
//! fertiliser nutrient for a handful of producer regions. Coverage is
//! completed geographically ([`fill_missing_regions`]) and over time
//! ([`fill_timeseries`]), then joined with corrected fertiliser use
//! ([`energy_footprint`]).

use eroi_core::diagnostics::categories;
use eroi_core::{Diagnostics, EroiError, EroiResult, RegionTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Continent assigned to inventory regions without a country (`RoW`, `GLO`).
pub const REST_OF_WORLD: &str = "ROW";

/// One life-cycle inventory value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityRecord {
    pub region: String,
    pub continent: String,
    pub subcontinent: String,
    pub fertiliser: String,
    /// Cumulative energy demand per unit of fertiliser
    pub energy_intensity: f64,
}

/// Where a filled intensity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSource {
    Observed,
    Subcontinent,
    Continent,
    Successor,
    RestOfWorld,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledIntensity {
    pub region: String,
    pub fertiliser: String,
    pub energy_stressor: f64,
    pub source: FillSource,
}

#[derive(Default)]
struct MeanAccumulator {
    sums: HashMap<(String, String), (f64, usize)>,
}

impl MeanAccumulator {
    fn push(&mut self, key: &str, fertiliser: &str, value: f64) {
        let entry = self
            .sums
            .entry((key.to_string(), fertiliser.to_string()))
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    fn mean(&self, key: &str, fertiliser: &str) -> Option<f64> {
        self.sums
            .get(&(key.to_string(), fertiliser.to_string()))
            .filter(|(_, n)| *n > 0)
            .map(|(sum, n)| sum / *n as f64)
    }
}

/// Intensity for every (region, fertiliser) pair over the union of
/// inventory regions and `target_regions`.
///
/// A missing or zero value is replaced, in order, by the mean of the
/// region's subcontinent, its continent, the region that succeeded a
/// dissolved state, and finally the rest-of-world mean. A pair none of
/// these cover is a `Validation` error.
pub fn fill_missing_regions(
    records: &[IntensityRecord],
    target_regions: &[String],
    table: &RegionTable,
) -> EroiResult<(Vec<FilledIntensity>, Diagnostics)> {
    let mut by_region = MeanAccumulator::default();
    let mut by_subcontinent = MeanAccumulator::default();
    let mut by_continent = MeanAccumulator::default();
    let mut geography: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();
    let mut fertilisers = BTreeSet::new();

    for r in records {
        by_region.push(&r.region, &r.fertiliser, r.energy_intensity);
        by_subcontinent.push(&r.subcontinent, &r.fertiliser, r.energy_intensity);
        by_continent.push(&r.continent, &r.fertiliser, r.energy_intensity);
        fertilisers.insert(r.fertiliser.clone());
        geography
            .entry(r.region.clone())
            .or_insert_with(|| (Some(r.continent.clone()), Some(r.subcontinent.clone())));
    }
    for region in target_regions {
        geography.entry(region.clone()).or_insert_with(|| {
            (
                table.continent(region).map(String::from),
                table.subcontinent(region).map(String::from),
            )
        });
    }

    let mut filled = Vec::with_capacity(geography.len() * fertilisers.len());
    let mut sources: BTreeMap<FillSource, usize> = BTreeMap::new();
    for (region, (continent, subcontinent)) in &geography {
        for fertiliser in &fertilisers {
            let (energy_stressor, source) = match by_region.mean(region, fertiliser) {
                Some(v) if v != 0.0 => (v, FillSource::Observed),
                _ => subcontinent
                    .as_deref()
                    .and_then(|s| by_subcontinent.mean(s, fertiliser))
                    .map(|v| (v, FillSource::Subcontinent))
                    .or_else(|| {
                        continent
                            .as_deref()
                            .and_then(|c| by_continent.mean(c, fertiliser))
                            .map(|v| (v, FillSource::Continent))
                    })
                    .or_else(|| {
                        table
                            .successor(region)
                            .and_then(|s| by_region.mean(s, fertiliser))
                            .map(|v| (v, FillSource::Successor))
                    })
                    .or_else(|| {
                        by_continent
                            .mean(REST_OF_WORLD, fertiliser)
                            .map(|v| (v, FillSource::RestOfWorld))
                    })
                    .ok_or_else(|| {
                        EroiError::Validation(format!(
                            "no energy intensity available for {fertiliser} in {region}"
                        ))
                    })?,
            };
            *sources.entry(source).or_default() += 1;
            filled.push(FilledIntensity {
                region: region.clone(),
                fertiliser: fertiliser.clone(),
                energy_stressor,
                source,
            });
        }
    }

    let mut diag = Diagnostics::new();
    for (source, count) in sources {
        if source != FillSource::Observed {
            diag.add_warning(
                categories::GAP_FILL,
                &format!("{count} intensities filled from {source:?} means"),
            );
        }
    }
    Ok((filled, diag))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeseriesSettings {
    /// Year the inventory values describe
    pub data_year: i32,
    /// Earliest year of the series
    pub first_year: i32,
    pub last_year: i32,
    /// Scale of the backcast value at `first_year`
    pub inefficiency: f64,
    /// Upper bound of the backcast, relative to the largest current value
    pub max_inefficiency: f64,
}

impl Default for TimeseriesSettings {
    fn default() -> Self {
        Self {
            data_year: 2016,
            first_year: 1980,
            last_year: 2020,
            inefficiency: 1.3,
            max_inefficiency: 1.1,
        }
    }
}

impl TimeseriesSettings {
    pub fn validate(&self) -> EroiResult<()> {
        if !(self.first_year < self.data_year && self.data_year <= self.last_year) {
            return Err(EroiError::Config(format!(
                "fertiliser years must satisfy first_year < data_year <= last_year, got {} / {} / {}",
                self.first_year, self.data_year, self.last_year
            )));
        }
        Ok(())
    }
}

/// Intensity per (year, region, fertiliser).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensitySeries {
    values: BTreeMap<(i32, String, String), f64>,
}

impl IntensitySeries {
    pub fn get(&self, year: i32, region: &str, fertiliser: &str) -> Option<f64> {
        self.values
            .get(&(year, region.to_string(), fertiliser.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extend filled intensities over `first_year..=last_year`.
///
/// The `first_year` value is `now * inefficiency`, kept between the smallest
/// current value of that fertiliser and `max_inefficiency` times the
/// largest. Years between `first_year` and `data_year` are interpolated
/// linearly; later years repeat the `data_year` value.
pub fn fill_timeseries(
    intensities: &[FilledIntensity],
    settings: &TimeseriesSettings,
) -> EroiResult<IntensitySeries> {
    settings.validate()?;

    let mut bounds: HashMap<&str, (f64, f64)> = HashMap::new();
    for f in intensities {
        let entry = bounds
            .entry(f.fertiliser.as_str())
            .or_insert((f64::INFINITY, f64::NEG_INFINITY));
        entry.0 = entry.0.min(f.energy_stressor);
        entry.1 = entry.1.max(f.energy_stressor);
    }

    let span = f64::from(settings.data_year - settings.first_year);
    let mut values = BTreeMap::new();
    for f in intensities {
        let now = f.energy_stressor;
        let (lo, hi) = bounds
            .get(f.fertiliser.as_str())
            .copied()
            .unwrap_or((now, now));
        let then = (now * settings.inefficiency)
            .min(hi * settings.max_inefficiency)
            .max(lo);
        for year in settings.first_year..=settings.last_year {
            let value = if year >= settings.data_year {
                now
            } else {
                let t = f64::from(year - settings.first_year) / span;
                then + (now - then) * t
            };
            values.insert((year, f.region.clone(), f.fertiliser.clone()), value);
        }
    }
    Ok(IntensitySeries { values })
}

/// Corrected fertiliser use of one product in one region and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub year: i32,
    pub iso3c: String,
    pub item: String,
    pub comm_group: String,
    pub group: String,
    pub fertiliser: String,
    pub fertiliser_use_corrected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    pub year: i32,
    pub iso3c: String,
    pub item: String,
    pub comm_group: String,
    pub group: String,
    pub fertiliser: String,
    pub fertiliser_use_corrected: f64,
    pub energy_stressor: Option<f64>,
    pub energy_footprint: Option<f64>,
}

/// Left join of consumption onto the intensity series on
/// (year, region, fertiliser). Rows without an intensity are kept with
/// empty stressor and footprint.
pub fn energy_footprint(
    consumption: &[ConsumptionRecord],
    series: &IntensitySeries,
) -> Vec<FootprintRecord> {
    consumption
        .iter()
        .map(|c| {
            let energy_stressor = series.get(c.year, &c.iso3c, &c.fertiliser);
            FootprintRecord {
                year: c.year,
                iso3c: c.iso3c.clone(),
                item: c.item.clone(),
                comm_group: c.comm_group.clone(),
                group: c.group.clone(),
                fertiliser: c.fertiliser.clone(),
                fertiliser_use_corrected: c.fertiliser_use_corrected,
                energy_stressor,
                energy_footprint: energy_stressor.map(|s| s * c.fertiliser_use_corrected),
            }
        })
        .collect()
}
