//! Diagnostics collected while computing a year.
//!
//! Data-quality anomalies that the pipeline recovers from locally (diagonal
//! self-consumption at or above one, non-finite intensities replaced by zero)
//! are never dropped silently: each one becomes a [`DiagnosticIssue`] that ends
//! up in the batch manifest, so the anomaly stays auditable per year.
//!
//! # Example
//!
//! ```
//! use eroi_core::diagnostics::{categories, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity(categories::DATA_QUALITY, "diagonal coefficient 1.02 clipped", "BR/Cattle");
//! diag.add_warning(categories::NUMERICAL, "3 non-finite intensities replaced with zero");
//!
//! assert_eq!(diag.warning_count(), 2);
//! assert_eq!(diag.issues_by_category(categories::DATA_QUALITY).count(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Category names used across the workspace.
pub mod categories {
    /// Technical coefficients that had to be modified before inversion
    pub const DATA_QUALITY: &str = "data-quality";
    /// Non-finite values replaced by zero
    pub const NUMERICAL: &str = "numerical";
    /// Region or time-series gaps filled from fallbacks
    pub const GAP_FILL: &str = "gap-fill";
}

/// A recovered anomaly. The computation went on with a substituted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    /// Category for grouping (see [`categories`])
    pub category: String,
    pub message: String,
    /// Optional entity reference (e.g. "BR/Cattle")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Optional year the issue was found in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl DiagnosticIssue {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            entity: None,
            year: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[warning:{}] {}", self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(year) = self.year {
            write!(f, " in {}", year)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for one operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues.push(DiagnosticIssue::new(category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Stamp every issue without a year with `year`.
    pub fn tag_year(&mut self, year: i32) {
        for issue in self.issues.iter_mut().filter(|i| i.year.is_none()) {
            issue.year = Some(year);
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        match self.warning_count() {
            0 => "No issues".to_string(),
            w => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
