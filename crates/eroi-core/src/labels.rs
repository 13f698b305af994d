//! Compound labels and ordered label registries.
//!
//! Input-output tables are keyed by multi-level labels: `(region, sector)`
//! for the industry axis, `(region, category)` for final demand and
//! `(product, flow)` for raw extensions. A [`LabelIndex`] keeps the labels of
//! one axis in file order and maps each label to its position, so dense
//! linear algebra can run on plain arrays while selections and joins are
//! done by label.

use crate::error::{Axis, EroiError, EroiResult};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Level holding the region in `(region, sector)` labels.
pub const REGION_LEVEL: usize = 0;
/// Level holding the sector (or final-demand category) in `(region, sector)` labels.
pub const SECTOR_LEVEL: usize = 1;

/// A multi-level label such as `("DE", "Wheat")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    levels: Vec<String>,
}

impl Label {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// Two-level `(region, sector)` label.
    pub fn pair(region: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            levels: vec![region.into(), sector.into()],
        }
    }

    /// Single-level label, used for energy carriers and totals.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            levels: vec![name.into()],
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&str> {
        self.levels.get(level).map(String::as_str)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn region(&self) -> Option<&str> {
        self.level(REGION_LEVEL)
    }

    pub fn sector(&self) -> Option<&str> {
        self.level(SECTOR_LEVEL)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.levels.join("/"))
    }
}

/// Ordered registry of the labels along one matrix axis.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    names: Vec<String>,
    labels: Vec<Label>,
    positions: HashMap<Label, usize>,
}

impl PartialEq for LabelIndex {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl LabelIndex {
    /// Build a registry. Level names describe the label levels (e.g.
    /// `["region", "sector"]`) and are carried into written tables.
    pub fn new(names: Vec<String>, labels: Vec<Label>) -> EroiResult<Self> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (idx, label) in labels.iter().enumerate() {
            if label.depth() != names.len() {
                return Err(EroiError::Validation(format!(
                    "label {} has {} levels, axis declares {}",
                    label,
                    label.depth(),
                    names.len()
                )));
            }
            if positions.insert(label.clone(), idx).is_some() {
                return Err(EroiError::Validation(format!("duplicate label {}", label)));
            }
        }
        Ok(Self {
            names,
            labels,
            positions,
        })
    }

    /// Registry of `(region, sector)` labels.
    pub fn region_sector(labels: Vec<Label>) -> EroiResult<Self> {
        Self::new(vec!["region".into(), "sector".into()], labels)
    }

    /// Registry of single-level labels under one level name.
    pub fn flat<I, S>(name: &str, labels: I) -> EroiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            vec![name.to_string()],
            labels.into_iter().map(Label::single).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Label> {
        self.labels.get(idx)
    }

    pub fn position(&self, label: &Label) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.positions.contains_key(label)
    }

    /// Position of `label`, failing with `LabelNotFound` on `axis`.
    pub fn require(&self, label: &Label, axis: Axis) -> EroiResult<usize> {
        self.position(label)
            .ok_or_else(|| EroiError::label_not_found(axis, label))
    }

    /// Distinct values of a level, in first-seen order.
    pub fn unique_level_values(&self, level: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.labels
            .iter()
            .filter_map(|l| l.level(level))
            .filter(|v| seen.insert(v.to_string()))
            .map(String::from)
            .collect()
    }

    /// Distinct sectors in first-seen order.
    pub fn sectors(&self) -> Vec<String> {
        self.unique_level_values(SECTOR_LEVEL)
    }

    pub fn contains_level_value(&self, level: usize, value: &str) -> bool {
        self.labels.iter().any(|l| l.level(level) == Some(value))
    }

    /// Keep labels whose `level` value satisfies `keep`, preserving order.
    ///
    /// Fails with [`EroiError::Config`] when the index has no such level.
    pub fn filter_level<F>(&self, level: usize, keep: F) -> EroiResult<Self>
    where
        F: Fn(&str) -> bool,
    {
        if level >= self.depth() {
            return Err(EroiError::Config(format!(
                "label level {level} does not exist in an index with levels [{}]",
                self.names.join(", ")
            )));
        }
        let labels: Vec<Label> = self
            .labels
            .iter()
            .filter(|l| l.level(level).is_some_and(&keep))
            .cloned()
            .collect();
        let positions = labels
            .iter()
            .enumerate()
            .map(|(idx, l)| (l.clone(), idx))
            .collect();
        Ok(Self {
            names: self.names.clone(),
            labels,
            positions,
        })
    }

    /// Labels whose sector is in `sectors`.
    pub fn select_sectors(&self, sectors: &HashSet<String>) -> EroiResult<Self> {
        self.filter_level(SECTOR_LEVEL, |s| sectors.contains(s))
    }

    /// Labels whose sector is not in `sectors`.
    pub fn drop_sectors(&self, sectors: &HashSet<String>) -> EroiResult<Self> {
        self.filter_level(SECTOR_LEVEL, |s| !sectors.contains(s))
    }

    /// Shape description used in error messages.
    pub fn describe(&self) -> String {
        match (self.labels.first(), self.labels.last()) {
            (Some(first), Some(last)) if self.len() > 1 => {
                format!("{} labels [{} .. {}]", self.len(), first, last)
            }
            (Some(first), _) => format!("1 label [{}]", first),
            _ => "0 labels".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LabelIndex {
        LabelIndex::region_sector(vec![
            Label::pair("AT", "Wheat"),
            Label::pair("AT", "Sugar"),
            Label::pair("DE", "Wheat"),
            Label::pair("DE", "Sugar"),
        ])
        .unwrap()
    }

    #[test]
    fn positions_follow_insertion_order() {
        let idx = index();
        assert_eq!(idx.position(&Label::pair("DE", "Wheat")), Some(2));
        assert_eq!(idx.sectors(), vec!["Wheat".to_string(), "Sugar".to_string()]);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = LabelIndex::region_sector(vec![Label::pair("AT", "Wheat"), Label::pair("AT", "Wheat")]);
        assert!(matches!(err, Err(EroiError::Validation(_))));
    }

    #[test]
    fn mixed_depth_labels_are_rejected() {
        let err = LabelIndex::region_sector(vec![Label::single("Wheat")]);
        assert!(err.is_err());
    }

    #[test]
    fn sector_filters_apply_to_every_region() {
        let idx = index();
        let wheat: HashSet<String> = ["Wheat".to_string()].into_iter().collect();
        let kept = idx.drop_sectors(&wheat).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|l| l.sector() == Some("Sugar")));
        assert_eq!(kept.position(&Label::pair("DE", "Sugar")), Some(1));

        let selected = idx.select_sectors(&wheat).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn filtering_a_missing_level_is_an_error() {
        let flat = LabelIndex::flat("iso3c", ["AUT", "DEU"]).unwrap();
        let err = flat.filter_level(SECTOR_LEVEL, |_| true).unwrap_err();
        assert!(matches!(err, EroiError::Config(_)));
        assert!(err.to_string().contains("iso3c"));

        let wheat: HashSet<String> = ["Wheat".to_string()].into_iter().collect();
        assert!(flat.drop_sectors(&wheat).is_err());
        assert_eq!(index().filter_level(REGION_LEVEL, |r| r == "DE").unwrap().len(), 2);
    }

    #[test]
    fn require_reports_axis() {
        let idx = index();
        let err = idx.require(&Label::pair("FR", "Wheat"), Axis::Rows).unwrap_err();
        assert!(err.to_string().contains("rows"));
    }
}
