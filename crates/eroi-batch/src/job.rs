use eroi_core::Diagnostics;
use serde::{Deserialize, Serialize};

/// Per-year pipeline stages that can be fanned out over a worker pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Upstream,
    Biomass,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Upstream => "upstream",
            TaskKind::Biomass => "biomass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearJob {
    pub job_id: String,
    pub year: i32,
    pub task: TaskKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub year: i32,
    pub status: String,
    pub error: Option<String>,
    pub outputs: Vec<String>,
    /// Diagonal coefficients replaced before inversion
    pub clipped: usize,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl BatchJobRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One job per year, in the given order, duplicates removed.
pub fn jobs_for_years(years: &[i32], task: TaskKind) -> Vec<YearJob> {
    let mut seen = std::collections::HashSet::new();
    years
        .iter()
        .filter(|year| seen.insert(**year))
        .map(|&year| YearJob {
            job_id: format!("{}:{}", task.as_str(), year),
            year,
            task,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_for_years_builds_identifiers() {
        let jobs = jobs_for_years(&[2010, 2011, 2010], TaskKind::Upstream);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, "upstream:2010");
        assert_eq!(jobs[1].year, 2011);
    }
}
