//! Target/cut/other sector partitions and the fertiliser scenarios.
//!
//! A partition names sectors, not (region, sector) pairs: a sector listed as
//! target or cut applies to every region of the table. The "other" set is
//! never configured; it is whatever survives after removing cut and target
//! sectors.
//!
//! Scenario selection happens here, before the engine runs. The numerical
//! core only ever receives a validated [`SectorPartition`].

use eroi_core::{Axis, EroiError, EroiResult, LabelIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sectors whose upstream footprint is sought, and sectors removed from the economy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorPartition {
    pub name: String,
    pub target: Vec<String>,
    #[serde(default)]
    pub cut: Vec<String>,
}

/// Label registries of a partition applied to one table.
#[derive(Debug, Clone)]
pub struct ResolvedPartition {
    /// All labels left after removing cut sectors
    pub kept: LabelIndex,
    pub target: LabelIndex,
    pub other: LabelIndex,
}

impl SectorPartition {
    pub fn new(name: impl Into<String>, target: Vec<String>, cut: Vec<String>) -> Self {
        Self {
            name: name.into(),
            target,
            cut,
        }
    }

    pub fn target_set(&self) -> HashSet<String> {
        self.target.iter().cloned().collect()
    }

    pub fn cut_set(&self) -> HashSet<String> {
        self.cut.iter().cloned().collect()
    }

    /// Target must be non-empty and disjoint from cut.
    pub fn validate(&self) -> EroiResult<()> {
        if self.target.is_empty() {
            return Err(EroiError::Config(format!(
                "partition '{}' has no target sectors",
                self.name
            )));
        }
        let cut = self.cut_set();
        let mut overlap: Vec<&str> = self
            .target
            .iter()
            .filter(|s| cut.contains(*s))
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            overlap.sort_unstable();
            overlap.dedup();
            return Err(EroiError::Config(format!(
                "partition '{}' lists sectors as both target and cut: {}",
                self.name,
                overlap.join(", ")
            )));
        }
        Ok(())
    }

    /// Apply to the labels of a technical-coefficient matrix.
    ///
    /// Every named sector must occur in `labels`, otherwise the call fails
    /// with `LabelNotFound`.
    pub fn resolve(&self, labels: &LabelIndex) -> EroiResult<ResolvedPartition> {
        self.validate()?;
        for sector in self.target.iter().chain(self.cut.iter()) {
            if !labels.contains_level_value(eroi_core::SECTOR_LEVEL, sector) {
                return Err(EroiError::label_not_found(Axis::Rows, sector));
            }
        }
        let kept = labels.drop_sectors(&self.cut_set())?;
        let target_set = self.target_set();
        let target = kept.select_sectors(&target_set)?;
        let other = kept.drop_sectors(&target_set)?;
        Ok(ResolvedPartition {
            kept,
            target,
            other,
        })
    }
}

/// Where fertiliser production sits in the upstream chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Fertiliser stays in the economy; its energy is attributed upstream
    #[default]
    IncludeFertiliserInChain,
    /// Fertiliser sectors are cut so their energy can be accounted separately
    ExcludeFertiliserAsCut,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::IncludeFertiliserInChain => "include-fertiliser-in-chain",
            Scenario::ExcludeFertiliserAsCut => "exclude-fertiliser-as-cut",
        }
    }

    /// Suffix appended to persisted file names.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Scenario::IncludeFertiliserInChain => "_incl_fertiliser",
            Scenario::ExcludeFertiliserAsCut => "",
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = EroiError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "include-fertiliser-in-chain" | "include" => Ok(Scenario::IncludeFertiliserInChain),
            "exclude-fertiliser-as-cut" | "exclude" => Ok(Scenario::ExcludeFertiliserAsCut),
            other => Err(EroiError::Config(format!(
                "unknown scenario '{}'; supported values: include-fertiliser-in-chain, exclude-fertiliser-as-cut",
                other
            ))),
        }
    }
}

/// The two partitions computed per year.
#[derive(Debug, Clone)]
pub struct ScenarioPartitions {
    pub scenario: Scenario,
    pub primary: SectorPartition,
    pub processed: SectorPartition,
}

/// Domain classification of the food-system sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorLists {
    pub agriculture: Vec<String>,
    pub fertiliser: Vec<String>,
    pub processed: Vec<String>,
}

impl Default for SectorLists {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            agriculture: owned(DEFAULT_AGRICULTURE),
            fertiliser: owned(DEFAULT_FERTILISER),
            processed: owned(DEFAULT_PROCESSED),
        }
    }
}

impl SectorLists {
    /// Every list non-empty and the three lists pairwise disjoint.
    pub fn validate(&self) -> EroiResult<()> {
        let lists = [
            ("agriculture", &self.agriculture),
            ("fertiliser", &self.fertiliser),
            ("processed", &self.processed),
        ];
        for (name, list) in lists.iter() {
            if list.is_empty() {
                return Err(EroiError::Config(format!("sector list '{name}' is empty")));
            }
        }
        for (i, (name_a, a)) in lists.iter().enumerate() {
            let set: HashSet<&String> = a.iter().collect();
            for (name_b, b) in lists.iter().skip(i + 1) {
                if let Some(shared) = b.iter().find(|s| set.contains(s)) {
                    return Err(EroiError::Config(format!(
                        "sector '{shared}' appears in both '{name_a}' and '{name_b}'"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn scenario_partitions(&self, scenario: Scenario) -> EroiResult<ScenarioPartitions> {
        self.validate()?;
        let (primary_cut, processed_cut) = match scenario {
            Scenario::IncludeFertiliserInChain => (Vec::new(), self.agriculture.clone()),
            Scenario::ExcludeFertiliserAsCut => {
                let mut processed_cut = self.agriculture.clone();
                processed_cut.extend(self.fertiliser.iter().cloned());
                (self.fertiliser.clone(), processed_cut)
            }
        };
        let primary = SectorPartition::new("primary", self.agriculture.clone(), primary_cut);
        let processed = SectorPartition::new("processed", self.processed.clone(), processed_cut);
        primary.validate()?;
        processed.validate()?;
        Ok(ScenarioPartitions {
            scenario,
            primary,
            processed,
        })
    }
}

pub const DEFAULT_AGRICULTURE: &[&str] = &[
    "Paddy rice",
    "Wheat",
    "Cereal grains nec",
    "Vegetables, fruit, nuts",
    "Oil seeds",
    "Sugar cane, sugar beet",
    "Plant-based fibers",
    "Crops nec",
    "Cattle",
    "Pigs",
    "Poultry",
    "Meat animals nec",
    "Animal products nec",
    "Raw milk",
    "Fish and other fishing products; services incidental of fishing (05)",
];

pub const DEFAULT_FERTILISER: &[&str] = &[
    "Chemical and fertilizer minerals, salt and other mining and quarrying products n.e.c.",
    "N-fertiliser",
    "P- and other fertiliser",
];

pub const DEFAULT_PROCESSED: &[&str] = &[
    "Products of meat cattle",
    "Products of meat pigs",
    "Products of meat poultry",
    "Meat products nec",
    "products of Vegetable oils and fats",
    "Dairy products",
    "Processed rice",
    "Sugar",
    "Food products nec",
    "Beverages",
    "Fish products",
];

#[cfg(test)]
mod tests {
    use super::*;
    use eroi_core::Label;

    fn labels() -> LabelIndex {
        let mut all = Vec::new();
        for region in ["AT", "DE"] {
            for sector in ["Wheat", "Sugar", "N-fertiliser", "Services"] {
                all.push(Label::pair(region, sector));
            }
        }
        LabelIndex::region_sector(all).unwrap()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overlapping_target_and_cut_is_a_config_error() {
        let p = SectorPartition::new("bad", strings(&["Wheat"]), strings(&["Wheat", "Sugar"]));
        assert!(matches!(p.validate(), Err(EroiError::Config(_))));
    }

    #[test]
    fn resolve_splits_labels_across_regions() {
        let p = SectorPartition::new("processed", strings(&["Sugar"]), strings(&["Wheat"]));
        let resolved = p.resolve(&labels()).unwrap();
        assert_eq!(resolved.kept.len(), 6);
        assert_eq!(resolved.target.len(), 2);
        assert_eq!(resolved.other.len(), 4);
        assert!(resolved.other.iter().all(|l| l.sector() != Some("Sugar")));
    }

    #[test]
    fn unknown_sector_is_label_not_found() {
        let p = SectorPartition::new("primary", strings(&["Barley"]), Vec::new());
        assert!(matches!(
            p.resolve(&labels()),
            Err(EroiError::LabelNotFound { .. })
        ));
    }

    #[test]
    fn include_scenario_keeps_fertiliser_in_chain() {
        let parts = SectorLists::default()
            .scenario_partitions(Scenario::IncludeFertiliserInChain)
            .unwrap();
        assert!(parts.primary.cut.is_empty());
        assert_eq!(parts.processed.cut, SectorLists::default().agriculture);
        assert_eq!(parts.scenario.output_suffix(), "_incl_fertiliser");
    }

    #[test]
    fn exclude_scenario_cuts_fertiliser() {
        let lists = SectorLists::default();
        let parts = lists
            .scenario_partitions(Scenario::ExcludeFertiliserAsCut)
            .unwrap();
        assert_eq!(parts.primary.cut, lists.fertiliser);
        assert_eq!(
            parts.processed.cut.len(),
            lists.agriculture.len() + lists.fertiliser.len()
        );
        assert_eq!(parts.scenario.output_suffix(), "");
    }

    #[test]
    fn shared_sector_between_lists_is_rejected() {
        let mut lists = SectorLists::default();
        lists.processed.push("Wheat".into());
        assert!(matches!(
            lists.scenario_partitions(Scenario::IncludeFertiliserInChain),
            Err(EroiError::Config(_))
        ));
    }

    #[test]
    fn scenario_parses_from_config_strings() {
        assert_eq!(
            "exclude".parse::<Scenario>().unwrap(),
            Scenario::ExcludeFertiliserAsCut
        );
        assert!("maybe".parse::<Scenario>().is_err());
        let toml: SectorPartition =
            toml::from_str("name = \"p\"\ntarget = [\"Wheat\"]\n").unwrap();
        assert!(toml.cut.is_empty());
    }
}
