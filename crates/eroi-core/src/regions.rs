//! Immutable region lookup table.
//!
//! Maps ISO3 region codes to their continent and UN subcontinent, and maps
//! dissolved states (e.g. `SUN`, `YUG`) to a successor whose data stands in
//! for them. Built once at startup and shared by reference.

use crate::error::{EroiError, EroiResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub iso3: String,
    pub continent: String,
    pub subcontinent: String,
}

/// Dissolved states and the successor used in their place.
pub const DEFAULT_SUCCESSORS: &[(&str, &str)] = &[
    ("SUN", "RUS"),
    ("BLX", "BEL"),
    ("CSK", "CZE"),
    ("YUG", "HRV"),
    ("SCG", "SRB"),
];

#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    regions: BTreeMap<String, RegionInfo>,
    successors: HashMap<String, String>,
}

impl RegionTable {
    /// Build from region records; duplicate codes are rejected.
    pub fn new(records: Vec<RegionInfo>) -> EroiResult<Self> {
        let mut regions = BTreeMap::new();
        for record in records {
            if record.iso3.trim().is_empty() {
                return Err(EroiError::Validation("region with empty ISO3 code".into()));
            }
            let code = record.iso3.clone();
            if regions.insert(code.clone(), record).is_some() {
                return Err(EroiError::Validation(format!("duplicate region code {code}")));
            }
        }
        let successors = DEFAULT_SUCCESSORS
            .iter()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect();
        Ok(Self {
            regions,
            successors,
        })
    }

    pub fn with_successor(mut self, dissolved: &str, successor: &str) -> Self {
        self.successors
            .insert(dissolved.to_string(), successor.to_string());
        self
    }

    pub fn get(&self, iso3: &str) -> Option<&RegionInfo> {
        self.regions.get(iso3)
    }

    pub fn continent(&self, iso3: &str) -> Option<&str> {
        self.get(iso3).map(|r| r.continent.as_str())
    }

    pub fn subcontinent(&self, iso3: &str) -> Option<&str> {
        self.get(iso3).map(|r| r.subcontinent.as_str())
    }

    pub fn successor(&self, iso3: &str) -> Option<&str> {
        self.successors.get(iso3).map(String::as_str)
    }

    /// Region codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(iso3: &str, continent: &str, subcontinent: &str) -> RegionInfo {
        RegionInfo {
            iso3: iso3.into(),
            continent: continent.into(),
            subcontinent: subcontinent.into(),
        }
    }

    #[test]
    fn lookups_resolve_hierarchy() {
        let table = RegionTable::new(vec![
            info("DEU", "Europe", "Western Europe"),
            info("BTN", "Asia", "Southern Asia"),
        ])
        .unwrap();
        assert_eq!(table.continent("BTN"), Some("Asia"));
        assert_eq!(table.subcontinent("DEU"), Some("Western Europe"));
        assert_eq!(table.successor("SUN"), Some("RUS"));
        assert_eq!(table.codes().collect::<Vec<_>>(), vec!["BTN", "DEU"]);
    }

    #[test]
    fn duplicates_are_rejected() {
        let result = RegionTable::new(vec![
            info("DEU", "Europe", "Western Europe"),
            info("DEU", "Europe", "Western Europe"),
        ]);
        assert!(result.is_err());
    }
}
